//! Session model and related functionality

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity, one row per issued token
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// New session creation payload
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Lifecycle position of a session relative to its expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `now < expires_at`
    Active,
    /// `expires_at <= now < expires_at + grace`, refreshable only
    Grace,
    /// Past the grace window
    Expired,
}

impl Session {
    /// Classify the session at `now` given the refresh grace period
    pub fn state(&self, now: DateTime<Utc>, grace: Duration) -> SessionState {
        if now < self.expires_at {
            SessionState::Active
        } else if now < self.expires_at + grace {
            SessionState::Grace
        } else {
            SessionState::Expired
        }
    }
}

/// Result of a successful register, login or refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResult {
    pub token: String,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_boundaries() {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "t".to_string(),
            expires_at: now,
            created_at: now - Duration::hours(24),
        };
        let grace = Duration::minutes(2);

        assert_eq!(
            session.state(now - Duration::seconds(1), grace),
            SessionState::Active
        );
        assert_eq!(session.state(now, grace), SessionState::Grace);
        assert_eq!(
            session.state(now + grace - Duration::seconds(1), grace),
            SessionState::Grace
        );
        assert_eq!(session.state(now + grace, grace), SessionState::Expired);
    }
}
