// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and login routes.

use super::extract::{json_rejection, ValidatedJson};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{RegisterRequest, TokenResponse, UserResponse};
use crate::AppState;
use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Public auth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Auth routes that need a bearer token.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth_service
        .register(&body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

async fn login(
    State(state): State<Arc<AppState>>,
    credentials: LoginCredentials,
) -> Result<Json<TokenResponse>> {
    let token = state
        .auth_service
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(token))
}

async fn me(Extension(user): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.user_id,
        email: user.email,
    })
}

// ─── Login body ──────────────────────────────────────────────

#[derive(Deserialize)]
struct JsonLogin {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// OAuth2 password-grant style form; `username` carries the email.
#[derive(Deserialize)]
struct FormLogin {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Login credentials from either a JSON or a form-encoded body.
#[derive(Debug)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    fn from_parts(email: Option<String>, password: Option<String>) -> Result<Self> {
        let email = email.map(|e| e.trim().to_string()).unwrap_or_default();
        let password = password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "email and password are required".to_string(),
            ));
        }
        Ok(Self { email, password })
    }
}

impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<FormLogin>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_parts(form.username, form.password)
        } else {
            let Json(body) = Json::<JsonLogin>::from_request(req, state)
                .await
                .map_err(json_rejection)?;
            Self::from_parts(body.email, body.password)
        }
    }
}
