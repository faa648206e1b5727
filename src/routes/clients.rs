// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client routes. All lookups are scoped to the caller.

use super::extract::ValidatedJson;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Client, ClientCreate, ClientListQuery, ClientUpdate};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/{id}", get(get_client).patch(update_client))
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ClientListQuery>,
) -> Result<Json<Vec<Client>>> {
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let clients = state.scheduling.list_clients(user.user_id, search).await?;
    Ok(Json(clients))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<ClientCreate>,
) -> Result<(StatusCode, Json<Client>)> {
    let client = state.scheduling.create_client(user.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Client>> {
    Ok(Json(state.scheduling.get_client(user.user_id, id).await?))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<ClientUpdate>,
) -> Result<Json<Client>> {
    let client = state.scheduling.update_client(user.user_id, id, body).await?;
    Ok(Json(client))
}
