//! HTTP surface of the authentication service

use auth::{
    AppState, SessionAuthority, SessionSettings,
    jwt::TokenCodec,
    models::TokenResult,
    repositories::{MemorySessionStore, MemoryUserStore},
    routes::create_router,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let authority = SessionAuthority::new(
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemorySessionStore::new()),
        TokenCodec::new(b"route-test-secret-route-test-secret").unwrap(),
        SessionSettings::default(),
    );
    create_router(AppState { authority })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authorized_post(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn register_request() -> Request<Body> {
    json_post(
        "/auth/register",
        json!({"email": "alice@example.com", "password": "Str0ng!Passw0rd", "name": "Alice"}),
    )
}

#[tokio::test]
async fn test_register_conflict_and_login() {
    let app = app();

    let (status, body) = send(&app, register_request()).await;
    assert_eq!(status, StatusCode::CREATED);
    let result: TokenResult = serde_json::from_value(body).unwrap();
    assert_eq!(result.email, "alice@example.com");

    let (status, _) = send(&app, register_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_post(
            "/auth/login",
            json!({"email": "alice@example.com", "password": "Str0ng!Passw0rd"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_post(
            "/auth/login",
            json!({"email": "alice@example.com", "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_logout_refresh_over_http() {
    let app = app();

    let (_, body) = send(&app, register_request()).await;
    let result: TokenResult = serde_json::from_value(body).unwrap();

    let (status, body) = send(&app, authorized_post("/auth/verify", &result.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, _) = send(&app, authorized_post("/auth/logout", &result.token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, authorized_post("/auth/verify", &result.token)).await;
    assert_eq!(body["valid"], false);

    let (status, _) = send(&app, authorized_post("/auth/refresh", &result.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_without_header_is_invalid() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/verify")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_refresh_and_me() {
    let app = app();

    let (_, body) = send(&app, register_request()).await;
    let old: TokenResult = serde_json::from_value(body).unwrap();

    let (status, body) = send(&app, authorized_post("/auth/refresh", &old.token)).await;
    assert_eq!(status, StatusCode::OK);
    let new: TokenResult = serde_json::from_value(body).unwrap();
    assert_ne!(new.token, old.token);

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", new.token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], new.user_id.to_string());
}
