// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment routes.

use super::extract::ValidatedJson;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Appointment, AppointmentCreate, AppointmentListQuery, AppointmentUpdate};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/{id}",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
}

async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    query: std::result::Result<Query<AppointmentListQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let appointments = state
        .scheduling
        .list_appointments(user.user_id, query)
        .await?;
    Ok(Json(appointments))
}

async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<AppointmentCreate>,
) -> Result<(StatusCode, Json<Appointment>)> {
    let appointment = state
        .scheduling
        .create_appointment(user.user_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Appointment>> {
    Ok(Json(state.scheduling.get_appointment(user.user_id, id).await?))
}

async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<AppointmentUpdate>,
) -> Result<Json<Appointment>> {
    let appointment = state
        .scheduling
        .update_appointment(user.user_id, id, body)
        .await?;
    Ok(Json(appointment))
}

async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.scheduling.delete_appointment(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
