// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler API: appointment booking for small service businesses.
//!
//! This crate provides the backend API (accounts, clients, appointments,
//! Google Calendar integration) and the worker that delivers queued
//! outbound messages.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use anyhow::Context;
use config::Config;
use db::Database;
use services::{
    AuthService, GoogleClient, GoogleIntegrationService, GoogleOidcVerifier, MessagingRegistry,
    SchedulingService, TasksService, TokenCipher,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub auth_service: AuthService,
    pub scheduling: SchedulingService,
    pub integrations: GoogleIntegrationService,
    pub tasks_service: TasksService,
}

impl AppState {
    /// Wire up services for the API server.
    ///
    /// ID tokens from Google are verified against live JWKS when OAuth is
    /// configured.
    pub fn new(config: Config, db: Database) -> anyhow::Result<Self> {
        let id_verifier = match config.google_client_id.as_deref() {
            Some(client_id) => Some(Arc::new(
                GoogleOidcVerifier::new(client_id).context("failed to build ID token verifier")?,
            )),
            None => None,
        };
        Self::with_id_verifier(config, db, id_verifier)
    }

    /// Like [`AppState::new`] with an explicit ID token verifier.
    pub fn with_id_verifier(
        config: Config,
        db: Database,
        id_verifier: Option<Arc<GoogleOidcVerifier>>,
    ) -> anyhow::Result<Self> {
        let cipher = TokenCipher::from_secret(&config.secret_key)?;
        let google = GoogleClient::from_config(&config)?;

        Ok(Self {
            auth_service: AuthService::new(
                db.clone(),
                &config.secret_key,
                config.access_token_expire_minutes,
                config.bcrypt_cost,
            ),
            scheduling: SchedulingService::new(db.clone()),
            integrations: GoogleIntegrationService::new(
                db.clone(),
                google,
                cipher,
                id_verifier,
                config.google_calendar_id.clone(),
            ),
            tasks_service: TasksService::from_config(&config),
            db,
            config,
        })
    }
}

/// Shared state for the message worker.
pub struct WorkerState {
    pub config: Config,
    pub messaging: MessagingRegistry,
    /// Verifies Cloud Tasks OIDC tokens (audience = worker URL).
    pub oidc_verifier: Arc<GoogleOidcVerifier>,
}

impl WorkerState {
    pub fn new(config: Config, oidc_verifier: Arc<GoogleOidcVerifier>) -> Self {
        Self {
            messaging: MessagingRegistry::with_builtin(&config.messaging_provider),
            oidc_verifier,
            config,
        }
    }
}
