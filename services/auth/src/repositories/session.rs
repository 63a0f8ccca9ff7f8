//! Session repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use crate::models::{NewSession, Session};

/// Durable token → session mapping
///
/// Every operation is atomic per row. `delete_by_token` reports whether it
/// removed the row so callers can use it as a compare-and-delete.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find a session by token, ignoring expiry
    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Session>>;

    /// Find a session by token whose expiry is after `now`
    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>>;

    /// Persist a new session
    async fn save(&self, session: &NewSession) -> DatabaseResult<Session>;

    /// Delete the session for `token`, returning true if a row was removed
    async fn delete_by_token(&self, token: &str) -> DatabaseResult<bool>;

    /// Delete every session of a user, returning the number removed
    async fn delete_by_user(&self, user_id: Uuid) -> DatabaseResult<u64>;

    /// Delete sessions with `expires_at <= now`, returning the number removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64>;
}

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &PgRow) -> Session {
    Session {
        id: row.get("id"),
        user_id: row.get("user_id"),
        token: row.get("token"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM sessions
            WHERE token = $1 AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn save(&self, session: &NewSession) -> DatabaseResult<Session> {
        debug!("Saving session for user: {}", session.user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict("session token already issued".to_string())
            }
            other => DatabaseError::Query(other),
        })?;

        Ok(session_from_row(&row))
    }

    async fn delete_by_token(&self, token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }
}
