// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler API Server
//!
//! Accounts, clients, appointments and the Google Calendar integration.

use anyhow::Context;
use scheduler_api::{config::Config, db::Database, logging::init_logging, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Scheduler API");

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to open database")?;
    tracing::info!("Database ready");

    if !config.google_oauth_ready() {
        tracing::warn!("Google OAuth is not configured; integration endpoints will return 503");
    }
    tracing::info!(
        project = %config.gcp_project_id,
        mode = ?config.tasks_mode,
        "Task dispatch configured"
    );

    let state = Arc::new(AppState::new(config.clone(), db)?);
    let app = scheduler_api::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
