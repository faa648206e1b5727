// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task handler routes for Cloud Tasks callbacks.
//!
//! These endpoints are called by Cloud Tasks, not directly by users, and are
//! mounted only on the worker. `require_tasks_auth` guards them. A non-2xx
//! answer makes Cloud Tasks retry the delivery.

use crate::error::AppError;
use crate::services::messaging::MessageReceipt;
use crate::services::tasks::{SendMessageJob, SEND_MESSAGE_ENDPOINT};
use crate::WorkerState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

/// Task handler routes (called by Cloud Tasks).
pub fn routes() -> Router<Arc<WorkerState>> {
    Router::new().route(SEND_MESSAGE_ENDPOINT, post(send_message))
}

/// Deliver one queued message through its provider.
///
/// Bad payloads and unknown providers get 400 (retrying cannot help); a
/// provider failure gets 500 so the queue retries.
async fn send_message(
    State(state): State<Arc<WorkerState>>,
    payload: Result<Json<SendMessageJob>, JsonRejection>,
) -> Response {
    let job = match payload {
        Ok(Json(job)) => job,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected malformed message job");
            return AppError::BadRequest(rejection.body_text()).into_response();
        }
    };

    if job.to.trim().is_empty() || job.text.trim().is_empty() {
        return AppError::BadRequest("to and text must not be empty".to_string()).into_response();
    }

    let provider = match state.messaging.get(job.provider.as_deref()) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!(provider = ?job.provider, "Message job names unknown provider");
            return e.into_response();
        }
    };

    tracing::info!(
        user_id = ?job.user_id,
        provider = provider.name(),
        "Processing message job from Cloud Task"
    );

    match provider.send_message(job.user_id, &job.to, &job.text).await {
        Ok(receipt) => (StatusCode::OK, Json::<MessageReceipt>(receipt)).into_response(),
        Err(e) => {
            tracing::error!(
                user_id = ?job.user_id,
                provider = provider.name(),
                error = %e,
                "Message delivery failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
