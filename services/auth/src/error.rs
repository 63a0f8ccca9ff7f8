//! Error types for the session authority

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::jwt::TokenError;

/// Outcomes of the session authority operations
///
/// Everything except [`AuthError::StoreUnavailable`] and
/// [`AuthError::Internal`] is a terminal, caller-visible answer that must not
/// be retried.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("a user with this email already exists")]
    DuplicateUser,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("malformed token")]
    MalformedToken,

    #[error("no session for token")]
    InvalidToken,

    #[error("session expired beyond the refresh grace period")]
    ExpiredBeyondGrace,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid input: {0}")]
    Validation(String),

    /// The authoritative store failed or timed out; never treated as "invalid"
    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[from] DatabaseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed(_) => AuthError::MalformedToken,
            TokenError::WeakSecret => AuthError::Internal(e.to_string()),
        }
    }
}

/// Type alias for authority results
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Short machine-readable reason recorded on failure audit events
    pub const fn reason(&self) -> &'static str {
        match self {
            AuthError::DuplicateUser => "duplicate_user",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredBeyondGrace => "expired_beyond_grace",
            AuthError::UserNotFound => "user_not_found",
            AuthError::Validation(_) => "validation",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Internal(_) => "internal",
        }
    }

    /// HTTP status surfaced to the original caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MalformedToken
            | AuthError::InvalidToken
            | AuthError::ExpiredBeyondGrace
            | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::StoreUnavailable(e) => {
                error!("Session store failure: {}", e);
                "Service temporarily unavailable".to_string()
            }
            AuthError::Internal(e) => {
                error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::DuplicateUser.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::ExpiredBeyondGrace.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::StoreUnavailable(DatabaseError::Configuration("x".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
