// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Tasks authentication middleware for the worker.

use crate::config::MESSAGING_QUEUE_NAME;
use crate::services::google_oidc::OidcError;
use crate::WorkerState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header Cloud Tasks sets to the name of the delivering queue.
pub const QUEUE_NAME_HEADER: &str = "x-cloudtasks-queuename";

/// Require the queue header and a valid Cloud Tasks OIDC token for `/tasks/*`.
pub async fn require_tasks_auth(
    State(state): State<Arc<WorkerState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let queue_name_header = request.headers().get(QUEUE_NAME_HEADER);
    let is_valid_queue = queue_name_header
        .and_then(|h| h.to_str().ok())
        .is_some_and(|name| name == MESSAGING_QUEUE_NAME);

    if !is_valid_queue {
        tracing::warn!(
            header = ?queue_name_header,
            "Blocked tasks request with invalid queue header"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    let auth_header = request.headers().get(header::AUTHORIZATION);

    let principal = state
        .oidc_verifier
        .verify_cloud_tasks_token(auth_header, &state.config.tasks_service_account)
        .await
        .map_err(|err| match err {
            OidcError::Forbidden(reason) => {
                tracing::warn!(reason = %reason, "Blocked tasks request: invalid OIDC token");
                StatusCode::FORBIDDEN
            }
            OidcError::Transient(reason) => {
                tracing::error!(reason = %reason, "Tasks OIDC verification transient failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    tracing::debug!(
        email = %principal.email,
        subject = %principal.subject,
        audience = %principal.audience,
        "Cloud Tasks OIDC verification succeeded"
    );

    Ok(next.run(request).await)
}
