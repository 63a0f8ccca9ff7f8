//! Session authority: register, login, logout, verify and refresh
//!
//! The authority owns every session row. Token liveness is decided by the
//! session store first and the token signature second; the grace period is
//! only ever consulted by [`SessionAuthority::refresh`].

use chrono::Duration;
use common::clock::{Clock, SystemClock};
use common::error::{DatabaseError, DatabaseResult};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditEventType, AuditSink, Severity, TracingAuditSink};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwt::TokenCodec;
use crate::models::{NewSession, NewUser, SessionState, TokenResult, User};
use crate::password::{hash_password, verify_password};
use crate::repositories::{SessionStore, UserStore};
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

/// Strip an optional `Bearer` scheme from an Authorization value.
///
/// Every public authority operation runs its input through this exactly once.
pub fn normalize_token(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => raw,
    }
}

/// Tunables of the session authority
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Lifetime of a freshly issued session
    pub session_ttl: Duration,
    /// How long after expiry a session may still be refreshed
    pub grace_period: Duration,
    /// Deadline for every store call
    pub store_timeout: std::time::Duration,
    /// Service name stamped on audit events
    pub service_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            grace_period: Duration::minutes(2),
            store_timeout: std::time::Duration::from_secs(2),
            service_name: "auth-service".to_string(),
        }
    }
}

impl From<&AuthConfig> for SessionSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            session_ttl: config.session_ttl,
            grace_period: config.grace_period,
            store_timeout: config.store_timeout,
            service_name: config.service_name.clone(),
        }
    }
}

/// Issues, verifies, refreshes and revokes session tokens
#[derive(Clone)]
pub struct SessionAuthority {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    settings: SessionSettings,
}

impl SessionAuthority {
    /// Create a new authority using the system clock and tracing audit sink
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        codec: TokenCodec,
        settings: SessionSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            codec,
            clock: Arc::new(SystemClock),
            audit: Arc::new(TracingAuditSink),
            settings,
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the audit sink
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Register a new user and open their first session
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<TokenResult> {
        let email = normalize_email(email);

        match self.try_register(&email, password, name).await {
            Ok(result) => {
                info!("Registered user {}", result.user_id);
                self.emit(
                    AuditEventType::Register,
                    result.user_id.to_string(),
                    "User registered",
                    Severity::Info,
                    &[("email", result.email.as_str()), ("outcome", "success")],
                );
                Ok(result)
            }
            Err(rejection) => Err(self.reject(
                AuditEventType::RegisterFailed,
                "Registration failed",
                email.clone(),
                rejection,
                &[("email", email.as_str())],
            )),
        }
    }

    async fn try_register(&self, email: &str, password: &str, name: &str) -> Result<TokenResult, Rejection> {
        validate_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;
        validate_name(name).map_err(AuthError::Validation)?;

        if self.bounded(self.users.find_by_email(email)).await?.is_some() {
            return Err(AuthError::DuplicateUser.into());
        }

        let new_user = NewUser {
            email: email.to_string(),
            password_hash: hash_off_thread(password).await?,
            name: name.trim().to_string(),
        };

        // A concurrent register of the same email loses on the unique index
        let user = match self.bounded(self.users.create(&new_user)).await {
            Ok(user) => user,
            Err(AuthError::StoreUnavailable(DatabaseError::Conflict(_))) => {
                return Err(AuthError::DuplicateUser.into());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.issue_session(&user).await?)
    }

    /// Authenticate with email and password and open a new session
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenResult> {
        let email = normalize_email(email);

        match self.try_login(&email, password).await {
            Ok(result) => {
                self.emit(
                    AuditEventType::Login,
                    result.user_id.to_string(),
                    "User logged in",
                    Severity::Info,
                    &[("email", result.email.as_str()), ("outcome", "success")],
                );
                Ok(result)
            }
            Err(rejection) => Err(self.reject(
                AuditEventType::LoginFailed,
                "Login failed",
                email.clone(),
                rejection,
                &[("email", email.as_str())],
            )),
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<TokenResult, Rejection> {
        let Some(user) = self.bounded(self.users.find_by_email(email)).await? else {
            return Err(Rejection::new(AuthError::InvalidCredentials, "user_not_found"));
        };

        if !verify_off_thread(password, &user.password_hash).await? {
            return Err(Rejection::new(AuthError::InvalidCredentials, "invalid_password")
                .subject(user.id.to_string()));
        }

        Ok(self.issue_session(&user).await?)
    }

    /// Delete the session behind `token`.
    ///
    /// An unparseable token is still deleted by its raw value so no session is
    /// left orphaned. Only a store failure is reported to the caller.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        let token = normalize_token(token);

        let subject = match self.codec.extract_user_id(token) {
            Ok(user_id) => user_id.to_string(),
            Err(e) => {
                warn!("Logout with undecodable token, deleting by raw value: {}", e);
                "unknown".to_string()
            }
        };

        let removed = match self.bounded(self.sessions.delete_by_token(token)).await {
            Ok(removed) => removed,
            Err(e) => {
                return Err(self.reject(
                    AuditEventType::LogoutFailed,
                    "Logout failed",
                    subject,
                    e.into(),
                    &[],
                ));
            }
        };

        self.emit(
            AuditEventType::Logout,
            subject,
            "User logged out",
            Severity::Info,
            &[
                ("outcome", "success"),
                ("session_removed", if removed { "true" } else { "false" }),
            ],
        );

        Ok(())
    }

    /// Delete every session of the user that owns `token`
    pub async fn logout_all(&self, token: &str) -> AuthResult<u64> {
        let token = normalize_token(token);

        if !self.verify(token).await? {
            return Err(AuthError::InvalidToken);
        }

        let user_id = self.codec.extract_user_id(token)?;
        let removed = self.bounded(self.sessions.delete_by_user(user_id)).await?;
        let removed_count = removed.to_string();

        self.emit(
            AuditEventType::LogoutAll,
            user_id.to_string(),
            "User logged out from all sessions",
            Severity::Info,
            &[("outcome", "success"), ("sessions_removed", removed_count.as_str())],
        );

        Ok(removed)
    }

    /// True iff a live session exists for `token` and its signature verifies
    pub async fn verify(&self, token: &str) -> AuthResult<bool> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Ok(false);
        }

        let now = self.clock.now();
        let session = self
            .bounded(self.sessions.find_valid_by_token(token, now))
            .await?;

        if session.is_none() {
            debug!("No live session for presented token");
            return Ok(false);
        }

        Ok(self.codec.validate_signature(token))
    }

    /// Decode the user id from `token` without consulting the store
    pub fn get_user_id(&self, token: &str) -> AuthResult<Uuid> {
        Ok(self.codec.extract_user_id(normalize_token(token))?)
    }

    /// Exchange a session token for a new one.
    ///
    /// Allowed while the session is active or within the grace period after
    /// expiry. Past the grace period the row is purged and the caller must log
    /// in again. The old row is removed with a compare-and-delete before the
    /// new session is issued, so of two concurrent refreshes of one token
    /// exactly one succeeds.
    pub async fn refresh(&self, old_token: &str) -> AuthResult<TokenResult> {
        let old_token = normalize_token(old_token);

        match self.try_refresh(old_token).await {
            Ok(result) => {
                self.emit(
                    AuditEventType::Refresh,
                    result.user_id.to_string(),
                    "Session refreshed",
                    Severity::Info,
                    &[("email", result.email.as_str()), ("outcome", "success")],
                );
                Ok(result)
            }
            Err(rejection) => Err(self.reject(
                AuditEventType::RefreshFailed,
                "Refresh failed",
                "unknown".to_string(),
                rejection,
                &[],
            )),
        }
    }

    async fn try_refresh(&self, old_token: &str) -> Result<TokenResult, Rejection> {
        let now = self.clock.now();

        let Some(session) = self.bounded(self.sessions.find_by_token(old_token)).await? else {
            return Err(AuthError::InvalidToken.into());
        };

        let user_id = session.user_id.to_string();
        let scoped = |error: AuthError| Rejection::from(error).subject(user_id.clone());

        if session.state(now, self.settings.grace_period) == SessionState::Expired {
            self.bounded(self.sessions.delete_by_token(old_token))
                .await
                .map_err(scoped)?;
            return Err(scoped(AuthError::ExpiredBeyondGrace));
        }

        let Some(user) = self
            .bounded(self.users.find_by_id(session.user_id))
            .await
            .map_err(scoped)?
        else {
            return Err(scoped(AuthError::UserNotFound));
        };

        if !self
            .bounded(self.sessions.delete_by_token(old_token))
            .await
            .map_err(scoped)?
        {
            // Another refresh or a logout removed the row after our lookup
            return Err(Rejection::new(AuthError::InvalidToken, "concurrent_refresh")
                .subject(user_id.clone()));
        }

        self.issue_session(&user).await.map_err(scoped)
    }

    async fn issue_session(&self, user: &User) -> AuthResult<TokenResult> {
        let now = self.clock.now();
        let (token, expires_at) = self
            .codec
            .generate(user.id, now, self.settings.session_ttl)?;

        let session = self
            .bounded(self.sessions.save(&NewSession {
                user_id: user.id,
                token,
                expires_at,
            }))
            .await?;

        debug!("Issued session {} for user {}", session.id, user.id);

        Ok(TokenResult {
            token: session.token,
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            expires_at: session.expires_at,
        })
    }

    /// Run a store call under the configured deadline
    async fn bounded<T>(&self, call: impl Future<Output = DatabaseResult<T>>) -> AuthResult<T> {
        let result = tokio::time::timeout(self.settings.store_timeout, call)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result?)
    }

    /// Record a failed account operation and hand back its error.
    ///
    /// `subject` is used unless the rejection names a more specific one.
    fn reject(
        &self,
        event_type: AuditEventType,
        description: &str,
        subject: String,
        rejection: Rejection,
        metadata: &[(&str, &str)],
    ) -> AuthError {
        let Rejection {
            error,
            reason,
            subject: specific,
        } = rejection;
        let subject = specific.unwrap_or(subject);
        let mut fields = metadata.to_vec();
        fields.push(("reason", reason));

        self.emit(
            event_type,
            subject,
            format!("{}: {}", description, reason),
            Severity::Warn,
            &fields,
        );
        error
    }

    fn emit(
        &self,
        event_type: AuditEventType,
        subject_id: String,
        description: impl Into<String>,
        severity: Severity,
        metadata: &[(&str, &str)],
    ) {
        let event = metadata.iter().fold(
            AuditEvent::new(
                self.settings.service_name.clone(),
                event_type,
                subject_id,
                description,
                severity,
            ),
            |event, (key, value)| event.with_metadata(*key, *value),
        )
        .at(self.clock.now());
        self.audit.emit(event);
    }
}

/// A failed account operation together with what its audit event records
struct Rejection {
    error: AuthError,
    reason: &'static str,
    subject: Option<String>,
}

impl Rejection {
    fn new(error: AuthError, reason: &'static str) -> Self {
        Self {
            error,
            reason,
            subject: None,
        }
    }

    fn subject(mut self, subject: String) -> Self {
        self.subject = Some(subject);
        self
    }
}

impl From<AuthError> for Rejection {
    fn from(error: AuthError) -> Self {
        let reason = error.reason();
        Self::new(error, reason)
    }
}

/// Argon2 is CPU-bound, keep it off the async workers
async fn hash_off_thread(password: &str) -> AuthResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))?
}

async fn verify_off_thread(password: &str, hash: &str) -> AuthResult<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(normalize_token("bearer   abc"), "abc");
        assert_eq!(normalize_token("BEARER\tabc "), "abc");
        assert_eq!(normalize_token("  abc.def.ghi "), "abc.def.ghi");
        assert_eq!(normalize_token("Basic dXNlcjpwYXNz"), "Basic dXNlcjpwYXNz");
        assert_eq!(normalize_token("Bearer"), "Bearer");
        assert_eq!(normalize_token(""), "");
    }
}
