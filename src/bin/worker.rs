// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Message worker: receives Cloud Tasks pushes and hands each job to a
//! messaging provider.

use anyhow::Context;
use scheduler_api::{
    config::Config, logging::init_logging, services::GoogleOidcVerifier, WorkerState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        default_provider = %config.messaging_provider,
        "Starting Scheduler worker"
    );

    let oidc_verifier = Arc::new(
        GoogleOidcVerifier::new(&config.worker_url)
            .context("Failed to initialize OIDC verifier")?,
    );

    let state = Arc::new(WorkerState::new(config.clone(), oidc_verifier));
    let app = scheduler_api::routes::create_worker_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Worker listening");

    axum::serve(listener, app).await?;
    Ok(())
}
