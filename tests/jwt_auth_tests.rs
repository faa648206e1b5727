// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! Tokens issued by `/auth/login` must decode with the claim layout the auth
//! middleware expects, and only with the server's secret.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use scheduler_api::middleware::auth::create_jwt;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, json_request};

/// Claims structure that must match what the middleware expects.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    iat: usize,
}

#[tokio::test]
async fn test_login_token_claims() {
    let (app, state) = common::create_test_app().await;
    let token = common::register_and_login(&app, "jwt@example.com", "Passw0rd!").await;
    let user = state
        .db
        .get_user_by_email("jwt@example.com")
        .await
        .unwrap()
        .unwrap();

    let data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.secret_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .expect("login token should decode with the server secret");

    assert_eq!(data.claims.sub, user.id.to_string());
    assert_eq!(
        data.claims.exp - data.claims.iat,
        state.config.access_token_expire_minutes as usize * 60
    );
}

#[tokio::test]
async fn test_token_survives_only_for_existing_user() {
    let (app, state) = common::create_test_app().await;
    let token = create_jwt(77, state.config.secret_key.as_bytes(), 5).unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            "/clients",
            Some(&token),
            Some(json!({ "name": "Ghost", "phone": "0" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}
