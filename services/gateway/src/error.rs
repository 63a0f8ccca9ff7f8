//! Custom error types for the gateway

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing, invalid or expired token
    #[error("Unauthorized")]
    Unauthorized,

    /// Client exceeded its request budget for the current window
    #[error("Too many requests")]
    RateLimited { retry_after: Duration },

    /// The session authority could not be reached or answered unexpectedly
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Upstream(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            GatewayError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            GatewayError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "Authentication service unavailable".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if let GatewayError::RateLimited { retry_after } = self {
            response.headers_mut().insert(
                RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
        }
        response
    }
}

/// Type alias for gateway results
pub type GatewayResult<T> = Result<T, GatewayError>;
