//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{AuthError, AuthResult},
    state::AppState,
};

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for token verification
#[derive(Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/verify", post(verify))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .with_state(state)
}

/// Raw Authorization header value, scheme included
fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Registration attempt for: {}", payload.email);

    let result = state
        .authority
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Login attempt for: {}", payload.email);

    let result = state
        .authority
        .login(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let token = authorization(&headers).ok_or(AuthError::InvalidToken)?;
    state.authority.logout(token).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

/// Logout from every session of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let token = authorization(&headers).ok_or(AuthError::InvalidToken)?;
    let removed = state.authority.logout_all(token).await?;

    Ok(Json(serde_json::json!({"sessions_removed": removed})))
}

/// Token verification endpoint used by the edge on cache misses
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<Json<VerifyResponse>> {
    let valid = match authorization(&headers) {
        Some(token) => state.authority.verify(token).await?,
        None => false,
    };

    Ok(Json(VerifyResponse { valid }))
}

/// Refresh token endpoint
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let token = authorization(&headers).ok_or(AuthError::InvalidToken)?;
    let result = state.authority.refresh(token).await?;

    Ok(Json(result))
}

/// Current user id decoded from the token
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let token = authorization(&headers).ok_or(AuthError::MalformedToken)?;
    let user_id = state.authority.get_user_id(token)?;

    Ok(Json(serde_json::json!({"user_id": user_id})))
}
