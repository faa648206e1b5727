// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use scheduler_api::config::Config;
use scheduler_api::db::Database;
use scheduler_api::routes::{create_router, create_worker_router};
use scheduler_api::services::GoogleOidcVerifier;
use scheduler_api::{AppState, WorkerState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

/// Key ID the static test verifier accepts.
pub const TEST_KID: &str = "scheduler-test-key";

const TEST_PRIVATE_KEY_PEM: &str = include_str!("../fixtures/oidc_test_key.pem");
const TEST_PUBLIC_KEY_PEM: &str = include_str!("../fixtures/oidc_test_key.pub.pem");

fn static_verifier(audience: &str) -> Arc<GoogleOidcVerifier> {
    let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY_PEM.as_bytes())
        .expect("test public key should parse");
    Arc::new(
        GoogleOidcVerifier::new_with_static_key(audience, TEST_KID, key)
            .expect("static verifier should build"),
    )
}

/// Create a test app with an in-memory database and mock task dispatch.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = Database::in_memory()
        .await
        .expect("in-memory database should open");
    let id_verifier = config.google_client_id.as_deref().map(static_verifier);

    let state = Arc::new(
        AppState::with_id_verifier(config, db, id_verifier).expect("state should build"),
    );
    (create_router(state.clone()), state)
}

/// Create the worker router with a static-key OIDC verifier.
#[allow(dead_code)]
pub fn create_test_worker() -> (Router, Arc<WorkerState>) {
    let config = Config::test_default();
    let verifier = static_verifier(&config.worker_url);
    let state = Arc::new(WorkerState::new(config, verifier));
    (create_worker_router(state.clone()), state)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign arbitrary claims with the test RSA key.
#[allow(dead_code)]
pub fn sign_google_jwt(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes())
        .expect("test private key should parse");
    encode(&header, claims, &key).expect("test JWT should sign")
}

/// OIDC token as Cloud Tasks would attach it for the configured service account.
#[allow(dead_code)]
pub fn create_test_tasks_oidc_jwt(config: &Config) -> String {
    let now = now_secs();
    sign_google_jwt(&json!({
        "iss": "https://accounts.google.com",
        "aud": config.worker_url,
        "sub": "112233445566778899",
        "email": config.tasks_service_account,
        "email_verified": true,
        "iat": now,
        "exp": now + 300,
    }))
}

/// ID token as Google's token endpoint would return it to our OAuth client.
#[allow(dead_code)]
pub fn create_test_id_token(config: &Config, email: &str) -> String {
    let now = now_secs();
    sign_google_jwt(&json!({
        "iss": "https://accounts.google.com",
        "aud": config.google_client_id.clone().unwrap_or_default(),
        "sub": "998877665544",
        "email": email,
        "email_verified": true,
        "iat": now,
        "exp": now + 3600,
    }))
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON (`Null` for an empty body).
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an account and return a bearer token for it.
#[allow(dead_code)]
pub async fn register_and_login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email, "password": password })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    body_json(response).await["access_token"]
        .as_str()
        .expect("login should return a token")
        .to_string()
}
