// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound message enqueue route.

use super::extract::ValidatedJson;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::tasks::SendMessageJob;
use crate::AppState;
use axum::{
    extract::State, http::StatusCode, routing::post, Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/messaging/whatsapp/send", post(send_whatsapp))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WhatsAppSendRequest {
    #[validate(
        length(max = 128, message = "must be at most 128 characters"),
        custom(function = "not_blank")
    )]
    pub to: String,
    #[validate(
        length(max = 1000, message = "must be at most 1000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub task_id: String,
    pub status: String,
}

/// Queue a WhatsApp message; delivery happens later in the worker.
async fn send_whatsapp(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<WhatsAppSendRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>)> {
    let job = SendMessageJob {
        provider: None,
        user_id: Some(user.user_id),
        to: body.to.trim().to_string(),
        text: body.text.trim().to_string(),
    };

    let task_id = state.tasks_service.queue_send_message(job).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            task_id,
            status: "queued".to_string(),
        }),
    ))
}
