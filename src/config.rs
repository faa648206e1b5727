// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and passed to every service
//! through `AppState`; nothing reads the environment after that.

use std::env;

/// Cloud Tasks queue carrying outbound message jobs.
pub const MESSAGING_QUEUE_NAME: &str = "messaging";

const DEFAULT_GOOGLE_SCOPES: &str = "openid email https://www.googleapis.com/auth/calendar.readonly";

/// How async jobs are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasksMode {
    /// Google Cloud Tasks push queue.
    Cloud,
    /// In-memory recorder (tests and local development).
    Mock,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Secret used for session token signing and token-at-rest encryption
    pub secret_key: String,
    /// SQLx connection string
    pub database_url: String,
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS and OAuth redirects
    pub frontend_url: String,
    /// Bearer token lifetime
    pub access_token_expire_minutes: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,

    // --- Google OAuth / Calendar ---
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub google_scopes: Vec<String>,
    pub google_calendar_id: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_api_base: String,

    // --- Messaging / Cloud Tasks ---
    /// Name of the default messaging provider
    pub messaging_provider: String,
    pub gcp_project_id: String,
    pub gcp_region: String,
    /// Base URL of the worker service (also the OIDC audience)
    pub worker_url: String,
    /// Service account Cloud Tasks signs OIDC tokens as
    pub tasks_service_account: String,
    pub tasks_mode: TasksMode,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let secret_key = env::var("SECRET_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SECRET_KEY"))?;
        if secret_key.is_empty() {
            return Err(ConfigError::Invalid("SECRET_KEY", "must not be empty".to_string()));
        }

        let gcp_project_id = env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
        let tasks_service_account = env::var("TASKS_SERVICE_ACCOUNT").unwrap_or_else(|_| {
            format!("scheduler-tasks@{}.iam.gserviceaccount.com", gcp_project_id)
        });

        let tasks_mode = match env::var("TASKS_MODE").as_deref() {
            Ok("mock") => TasksMode::Mock,
            Ok("cloud") | Err(_) => TasksMode::Cloud,
            Ok(other) => {
                return Err(ConfigError::Invalid(
                    "TASKS_MODE",
                    format!("expected 'cloud' or 'mock', got '{other}'"),
                ))
            }
        };

        Ok(Self {
            secret_key,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/scheduler.db".to_string()),
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            access_token_expire_minutes: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,

            google_client_id: optional_var("GOOGLE_CLIENT_ID"),
            google_client_secret: optional_var("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri: optional_var("GOOGLE_REDIRECT_URI"),
            google_scopes: parse_scopes(
                &env::var("GOOGLE_SCOPES").unwrap_or_else(|_| DEFAULT_GOOGLE_SCOPES.to_string()),
            ),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|_| "primary".to_string()),
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            google_api_base: env::var("GOOGLE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://www.googleapis.com".to_string()),

            messaging_provider: env::var("MESSAGING_PROVIDER")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| "stub_whatsapp".to_string()),
            gcp_project_id,
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| "us-central1".to_string()),
            worker_url: env::var("WORKER_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            tasks_service_account,
            tasks_mode,
        })
    }

    /// Configuration for tests: in-memory database, mock dispatch, cheap hashing.
    pub fn test_default() -> Self {
        Self {
            secret_key: "test_secret_key_32_bytes_minimum!!".to_string(),
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            frontend_url: "http://localhost:3002".to_string(),
            access_token_expire_minutes: 30,
            bcrypt_cost: 4,
            google_client_id: Some("test-client-id.apps.googleusercontent.com".to_string()),
            google_client_secret: Some("test-client-secret".to_string()),
            google_redirect_uri: Some(
                "http://localhost:8080/integrations/google/callback".to_string(),
            ),
            google_scopes: parse_scopes(DEFAULT_GOOGLE_SCOPES),
            google_calendar_id: "primary".to_string(),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            google_token_url: "https://oauth2.googleapis.com/token".to_string(),
            google_api_base: "https://www.googleapis.com".to_string(),
            messaging_provider: "stub_whatsapp".to_string(),
            gcp_project_id: "test-project".to_string(),
            gcp_region: "us-central1".to_string(),
            worker_url: "http://localhost:8081".to_string(),
            tasks_service_account: "scheduler-tasks@test-project.iam.gserviceaccount.com"
                .to_string(),
            tasks_mode: TasksMode::Mock,
        }
    }

    /// True when all three Google OAuth settings are present.
    pub fn google_oauth_ready(&self) -> bool {
        self.google_client_id.is_some()
            && self.google_client_secret.is_some()
            && self.google_redirect_uri.is_some()
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Scopes may be separated by spaces or commas.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
