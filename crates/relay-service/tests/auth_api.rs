//! Account endpoint integration tests.
//!
//! Runs the full router against the in-memory credential store, exercising
//! registration, login, renewal rotation, session listing, and room
//! provisioning through real HTTP requests.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::secret::SecretString;
use credential::service::CredentialService;
use credential::signer::{AccessVerifier, TokenSigner};
use credential::store::memory::MemoryStore;
use relay_service::actors::registry::RoomRegistry;
use relay_service::routes::{build_routes, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

fn test_app() -> Router {
    let signer = TokenSigner::new(
        &SecretString::from("api-test-secret"),
        Duration::from_secs(3600),
    );
    let verifier: Arc<dyn AccessVerifier> = Arc::new(signer.clone());
    let credentials = CredentialService::new(
        Arc::new(MemoryStore::new()),
        signer,
        Duration::from_secs(86_400),
    );
    let cancel_token = CancellationToken::new();

    build_routes(Arc::new(AppState {
        credentials,
        verifier,
        registry: RoomRegistry::new(cancel_token.clone()),
        public_ws_base: None,
        cancel_token,
    }))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get_with_bearer(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_with_bearer(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

async fn register(app: &Router, username: &str, device_id: Option<&str>) -> Value {
    let mut body = json!({"username": username, "password": "correct horse"});
    if let Some(device_id) = device_id {
        body["device_id"] = json!(device_id);
    }
    let (status, body) = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

#[tokio::test]
async fn test_register_issues_full_credential_set() {
    let app = test_app();

    let body = register(&app, "alice", None).await;

    assert_eq!(body["user"]["username"], "alice");
    uuid::Uuid::parse_str(body["user"]["id"].as_str().unwrap()).expect("user id should be a UUID");

    let access_token = body["access_token"].as_str().unwrap();
    assert_eq!(access_token.split('.').count(), 3, "expected a JWT");

    let refresh_token = body["refresh_token"].as_str().unwrap();
    assert_eq!(refresh_token.len(), 64);
    assert!(refresh_token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_register_trims_username() {
    let app = test_app();

    let body = register(&app, "  alice  ", None).await;
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = test_app();
    register(&app, "alice", None).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/register",
        json!({"username": "alice", "password": "different"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_rejects_empty_credentials() {
    let app = test_app();

    for payload in [
        json!({"username": "   ", "password": "pw"}),
        json!({"username": "alice", "password": ""}),
    ] {
        let (status, body) = post_json(&app, "/api/v1/auth/register", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "EMPTY_CREDENTIALS");
    }
}

#[tokio::test]
async fn test_login_returns_fresh_credentials() {
    let app = test_app();
    let registered = register(&app, "alice", None).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "alice", "password": "correct horse"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_ne!(
        body["refresh_token"], registered["refresh_token"],
        "each login issues its own renewal secret"
    );
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "alice", None).await;

    let (wrong_status, wrong_body) = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "alice", "password": "wrong"}),
    )
    .await;
    let (unknown_status, unknown_body) = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "nobody", "password": "wrong"}),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_body, unknown_body,
        "wrong password and unknown user must look identical"
    );
    assert_eq!(wrong_body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_refresh_rotates_and_spends_the_secret() {
    let app = test_app();
    let registered = register(&app, "alice", None).await;
    let first_secret = registered["refresh_token"].as_str().unwrap();

    let (status, rotated) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": first_secret}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], registered["refresh_token"]);

    // The old secret is single-use
    let (status, body) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": first_secret}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    // The replacement still works
    let (status, _) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": rotated["refresh_token"].as_str().unwrap()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_require_a_bearer_token() {
    let app = test_app();

    let (status, body) = get_with_bearer(&app, "/api/v1/auth/sessions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, body) = get_with_bearer(&app, "/api/v1/auth/sessions", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_sessions_reflect_issuance_and_rotation() {
    let app = test_app();
    let registered = register(&app, "alice", Some("laptop")).await;
    let access_token = registered["access_token"].as_str().unwrap();

    let (status, body) = get_with_bearer(&app, "/api/v1/auth/sessions", Some(access_token)).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions.first().unwrap()["device_id"], "laptop");

    // Rotation replaces the record instead of accumulating
    let (status, _) = post_json(
        &app,
        "/api/v1/auth/refresh",
        json!({"refresh_token": registered["refresh_token"].as_str().unwrap()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_with_bearer(&app, "/api/v1/auth/sessions", Some(access_token)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // A second login is a second session
    let (status, _) = post_json(
        &app,
        "/api/v1/auth/login",
        json!({"username": "alice", "password": "correct horse", "device_id": "phone"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_with_bearer(&app, "/api/v1/auth/sessions", Some(access_token)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_room_creation_requires_auth_and_returns_join_url() {
    let app = test_app();

    let (status, body) = post_with_bearer(&app, "/api/v1/rooms", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "got body {body}");

    let registered = register(&app, "alice", None).await;
    let access_token = registered["access_token"].as_str().unwrap();

    let (status, body) = post_with_bearer(&app, "/api/v1/rooms", Some(access_token)).await;
    assert_eq!(status, StatusCode::CREATED);

    let room_id = body["room_id"].as_str().unwrap();
    assert_eq!(room_id.len(), 32);
    assert!(room_id.chars().all(|c| c.is_ascii_hexdigit()));

    let ws_url = body["ws_url"].as_str().unwrap();
    assert!(ws_url.starts_with("ws://"));
    assert!(ws_url.ends_with(&format!("/ws/{room_id}")));
}

#[tokio::test]
async fn test_room_ids_are_unique_per_request() {
    let app = test_app();
    let registered = register(&app, "alice", None).await;
    let access_token = registered["access_token"].as_str().unwrap();

    let (_, first) = post_with_bearer(&app, "/api/v1/rooms", Some(access_token)).await;
    let (_, second) = post_with_bearer(&app, "/api/v1/rooms", Some(access_token)).await;
    assert_ne!(first["room_id"], second["room_id"]);
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let (status, body) = get_with_bearer(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}
