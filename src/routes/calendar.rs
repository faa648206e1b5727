// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event listing backed by the user's Google integration.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::EventsResponse;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_MAX_RESULTS: u32 = 10;
const MAX_MAX_RESULTS: u32 = 250;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/calendar/events", get(list_events))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub max_results: Option<u32>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    let max_results = query
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_MAX_RESULTS);

    let response = match state
        .integrations
        .fetch_events(user.user_id, max_results)
        .await?
    {
        Some(items) => EventsResponse {
            items,
            source: "google".to_string(),
        },
        None => EventsResponse {
            items: Vec::new(),
            source: "none".to_string(),
        },
    };

    Ok(Json(response))
}
