//! Gateway routes

use axum::{
    Json, Router,
    http::{HeaderMap, header::AUTHORIZATION},
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    error::{GatewayError, GatewayResult},
    middleware::{edge_auth, rate_limit},
};

/// Create the router for the gateway
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/protected", get(protected_route))
        .route_layer(middleware::from_fn_with_state(state.clone(), edge_auth));

    let throttled_routes = Router::new()
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .merge(throttled_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "gateway"
    }))
}

/// Logout through the edge so the cached verdict goes with the session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> GatewayResult<impl IntoResponse> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;

    state.edge.logout(authorization).await?;

    Ok(Json(json!({"message": "Logged out successfully"})))
}

/// Protected route example
pub async fn protected_route() -> impl IntoResponse {
    Json(json!({
        "message": "This is a protected route"
    }))
}
