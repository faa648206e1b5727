// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security tests for the worker's Cloud Task handlers.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;
use common::body_json;

fn send_message_request(queue: Option<&str>, token: Option<&str>, payload: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/tasks/send-message")
        .header("content-type", "application/json");
    if let Some(queue) = queue {
        builder = builder.header("x-cloudtasks-queuename", queue);
    }
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(payload).unwrap()))
        .unwrap()
}

fn payload() -> Value {
    json!({
        "provider": "stub_whatsapp",
        "user_id": 7,
        "to": "+15551234567",
        "text": "Reminder: appointment tomorrow"
    })
}

#[tokio::test]
async fn test_send_message_no_header_forbidden() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(send_message_request(None, Some(&token), &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_message_missing_auth_forbidden() {
    let (app, _) = common::create_test_worker();

    let response = app
        .oneshot(send_message_request(Some("messaging"), None, &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_message_wrong_queue_name_forbidden() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(send_message_request(Some("wrong-queue"), Some(&token), &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_message_wrong_service_account_forbidden() {
    let (app, state) = common::create_test_worker();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let token = common::sign_google_jwt(&json!({
        "iss": "https://accounts.google.com",
        "aud": state.config.worker_url,
        "sub": "1",
        "email": "attacker@evil.iam.gserviceaccount.com",
        "email_verified": true,
        "iat": now,
        "exp": now + 300,
    }));

    let response = app
        .oneshot(send_message_request(Some("messaging"), Some(&token), &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_message_wrong_audience_forbidden() {
    let (app, state) = common::create_test_worker();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let token = common::sign_google_jwt(&json!({
        "iss": "https://accounts.google.com",
        "aud": "https://some-other-service.example.com",
        "sub": "1",
        "email": state.config.tasks_service_account,
        "email_verified": true,
        "iat": now,
        "exp": now + 300,
    }));

    let response = app
        .oneshot(send_message_request(Some("messaging"), Some(&token), &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_send_message_delivers_with_valid_token() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(send_message_request(Some("messaging"), Some(&token), &payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "provider": "whatsapp:stub",
            "status": "sent",
            "to": "+15551234567",
            "message": "Reminder: appointment tomorrow"
        })
    );
}

#[tokio::test]
async fn test_send_message_default_provider() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(send_message_request(
            Some("messaging"),
            Some(&token),
            &json!({ "to": "+1555", "text": "hi" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["provider"], "whatsapp:stub");
}

#[tokio::test]
async fn test_send_message_unknown_provider_bad_request() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);
    let mut job = payload();
    job["provider"] = json!("carrier_pigeon");

    let response = app
        .oneshot(send_message_request(Some("messaging"), Some(&token), &job))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_message_malformed_payload_bad_request() {
    let (app, state) = common::create_test_worker();
    let token = common::create_test_tasks_oidc_jwt(&state.config);

    let response = app
        .oneshot(send_message_request(
            Some("messaging"),
            Some(&token),
            &json!({ "user_id": "not-a-number" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_worker_health_is_public() {
    let (app, _) = common::create_test_worker();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
