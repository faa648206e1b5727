// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google integration routes: OAuth start/callback, status, disconnect.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::integration::{AuthorizationStart, IntegrationStatusResponse};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// The OAuth callback is hit by the browser coming back from Google and
/// carries no bearer token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/integrations/google/callback", get(google_callback))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/integrations/google/start", post(start_google_oauth))
        .route("/integrations/google/status", get(google_status))
        .route("/integrations/google/disconnect", post(disconnect_google))
}

async fn google_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<IntegrationStatusResponse>> {
    let integration = state.integrations.status(user.user_id).await?;
    Ok(Json(IntegrationStatusResponse::from(&integration)))
}

async fn start_google_oauth(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AuthorizationStart>> {
    Ok(Json(state.integrations.initiate(user.user_id).await?))
}

async fn disconnect_google(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<IntegrationStatusResponse>> {
    let integration = state.integrations.disconnect(user.user_id).await?;
    Ok(Json(IntegrationStatusResponse::from(&integration)))
}

// ─── OAuth Callback ──────────────────────────────────────────

/// OAuth callback query parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Google when the user denies consent.
    pub error: Option<String>,
}

/// Handle the redirect back from Google and bounce to the frontend settings page.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackQuery>,
) -> Redirect {
    let settings_url = format!("{}/settings", state.config.frontend_url);
    let error_redirect = |reason: &str| {
        Redirect::to(&format!(
            "{}?google=error&message={}",
            settings_url,
            urlencoding::encode(reason)
        ))
    };

    if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
        tracing::warn!(error, "Google OAuth denied");
        return error_redirect(error);
    }

    let (Some(code), Some(oauth_state)) = (
        params.code.as_deref().filter(|c| !c.is_empty()),
        params.state.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return error_redirect("missing_code");
    };

    match state.integrations.complete(oauth_state, code).await {
        Ok(Some(completion)) if completion.connected => {
            Redirect::to(&format!("{}?google=success", settings_url))
        }
        Ok(Some(_)) => error_redirect("exchange_failed"),
        Ok(None) => error_redirect("invalid_state"),
        Err(e) => {
            tracing::error!(error = %e, "Google OAuth callback failed");
            error_redirect("internal_error")
        }
    }
}
