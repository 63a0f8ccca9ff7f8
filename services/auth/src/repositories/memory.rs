//! In-memory user and session stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::clock::{Clock, SystemClock};
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionStore, UserStore};
use crate::models::{NewSession, NewUser, Session, User};

/// User store held in process memory
#[derive(Clone)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Remove a user, as an operator deleting the account would
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Conflict(format!(
                "email {} already registered",
                new_user.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            name: new_user.name.clone(),
            created_at: self.clock.now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

/// Session store held in process memory, keyed by token
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored rows, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn find_valid_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .cloned())
    }

    async fn save(&self, session: &NewSession) -> DatabaseResult<Session> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Err(DatabaseError::Conflict(
                "session token already issued".to_string(),
            ));
        }

        let stored = Session {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            token: session.token.clone(),
            expires_at: session.expires_at,
            created_at: self.clock.now(),
        };
        sessions.insert(stored.token.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete_by_token(&self, token: &str) -> DatabaseResult<bool> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }

    async fn delete_by_user(&self, user_id: Uuid) -> DatabaseResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_session(user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> NewSession {
        NewSession {
            user_id,
            token: token.to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_find_valid_ignores_expired_rows() -> DatabaseResult<()> {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store
            .save(&new_session(Uuid::new_v4(), "t", now))
            .await?;

        assert!(store.find_by_token("t").await?.is_some());
        assert!(store.find_valid_by_token("t", now).await?.is_none());
        assert!(
            store
                .find_valid_by_token("t", now - Duration::seconds(1))
                .await?
                .is_some()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_token_strings_are_unique() -> DatabaseResult<()> {
        let store = MemorySessionStore::new();
        let expires_at = Utc::now() + Duration::hours(1);
        store
            .save(&new_session(Uuid::new_v4(), "dup", expires_at))
            .await?;
        let second = store
            .save(&new_session(Uuid::new_v4(), "dup", expires_at))
            .await;
        assert!(matches!(second, Err(DatabaseError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_by_token_reports_removal() -> DatabaseResult<()> {
        let store = MemorySessionStore::new();
        store
            .save(&new_session(Uuid::new_v4(), "t", Utc::now()))
            .await?;
        assert!(store.delete_by_token("t").await?);
        assert!(!store.delete_by_token("t").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_by_user_and_expired() -> DatabaseResult<()> {
        let store = MemorySessionStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let now = Utc::now();

        store.save(&new_session(alice, "a1", now + Duration::hours(1))).await?;
        store.save(&new_session(alice, "a2", now - Duration::hours(1))).await?;
        store.save(&new_session(bob, "b1", now - Duration::hours(1))).await?;

        assert_eq!(store.delete_expired(now).await?, 2);
        assert_eq!(store.delete_expired(now).await?, 0);
        assert_eq!(store.delete_by_user(alice).await?, 1);
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_user_email_is_unique() -> DatabaseResult<()> {
        let store = MemoryUserStore::new();
        let new_user = NewUser {
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Alice".to_string(),
        };

        let user = store.create(&new_user).await?;
        assert_eq!(store.find_by_id(user.id).await?.map(|u| u.email), Some(new_user.email.clone()));
        assert!(matches!(
            store.create(&new_user).await,
            Err(DatabaseError::Conflict(_))
        ));
        Ok(())
    }
}
