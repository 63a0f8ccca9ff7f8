//! Short-lived cache of token verification verdicts
//!
//! Entries are keyed by the raw `Authorization` header value, scheme
//! included. The cache is never the source of truth: any store failure
//! degrades to a miss so the caller goes back to the session authority.

use common::cache::{CacheStore, with_timeout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "auth:verdict:";

/// Token cache configuration
#[derive(Debug, Clone)]
pub struct TokenCacheConfig {
    /// Lifetime of a cached verdict
    pub ttl: Duration,
    /// Deadline for every store call
    pub timeout: Duration,
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(900), // 15 minutes
            timeout: Duration::from_millis(250),
        }
    }
}

/// Verdict cache in front of the session authority
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn CacheStore>,
    config: TokenCacheConfig,
}

impl TokenCache {
    /// Create a new token cache over `store`
    pub fn new(store: Arc<dyn CacheStore>, config: TokenCacheConfig) -> Self {
        Self { store, config }
    }

    fn key(token: &str) -> String {
        format!("{}{}", KEY_PREFIX, token)
    }

    /// Cached verdict for `token`, `None` when absent or unreadable
    pub async fn get(&self, token: &str) -> Option<bool> {
        let key = Self::key(token);
        match with_timeout(self.config.timeout, self.store.get(&key)).await {
            Ok(Some(value)) => match value.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                other => {
                    warn!("Ignoring unexpected cached verdict: {}", other);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Token cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    /// Store `verdict` for `token`, replacing any earlier entry
    pub async fn put(&self, token: &str, verdict: bool) {
        let key = Self::key(token);
        let value = if verdict { "true" } else { "false" };
        if let Err(e) = with_timeout(
            self.config.timeout,
            self.store.set(&key, value, Some(self.config.ttl)),
        )
        .await
        {
            warn!("Failed to cache token verdict: {}", e);
        } else {
            debug!("Cached token verdict {}", verdict);
        }
    }

    /// Drop any cached verdict for `token`
    pub async fn invalidate(&self, token: &str) {
        let key = Self::key(token);
        if let Err(e) = with_timeout(self.config.timeout, self.store.delete(&key)).await {
            warn!("Failed to invalidate cached token verdict: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::UnreachableStore;
    use common::cache::MemoryStore;
    use common::clock::ManualClock;

    fn cache() -> (TokenCache, Arc<MemoryStore>, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        let cache = TokenCache::new(store.clone(), TokenCacheConfig::default());
        (cache, store, clock)
    }

    #[tokio::test]
    async fn test_put_then_get_until_ttl() {
        let (cache, _store, clock) = cache();

        assert_eq!(cache.get("Bearer abc").await, None);
        cache.put("Bearer abc", true).await;
        assert_eq!(cache.get("Bearer abc").await, Some(true));

        clock.advance(chrono::Duration::seconds(899));
        assert_eq!(cache.get("Bearer abc").await, Some(true));

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.get("Bearer abc").await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_invalidate_removes() {
        let (cache, _store, _clock) = cache();

        cache.put("Bearer abc", true).await;
        cache.put("Bearer abc", false).await;
        assert_eq!(cache.get("Bearer abc").await, Some(false));

        cache.invalidate("Bearer abc").await;
        assert_eq!(cache.get("Bearer abc").await, None);

        // Invalidating a missing entry is harmless
        cache.invalidate("Bearer abc").await;
    }

    #[tokio::test]
    async fn test_raw_header_is_the_key() {
        let (cache, _store, _clock) = cache();

        cache.put("Bearer abc", true).await;
        assert_eq!(cache.get("abc").await, None);
        assert_eq!(cache.get("bearer abc").await, None);
    }

    #[tokio::test]
    async fn test_garbage_entry_is_a_miss() {
        let (cache, store, _clock) = cache();

        store
            .set("auth:verdict:Bearer abc", "maybe", None)
            .await
            .unwrap();
        assert_eq!(cache.get("Bearer abc").await, None);
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_miss() {
        let cache = TokenCache::new(Arc::new(UnreachableStore), TokenCacheConfig::default());

        cache.put("Bearer abc", true).await;
        assert_eq!(cache.get("Bearer abc").await, None);
        cache.invalidate("Bearer abc").await;
    }

    #[tokio::test]
    async fn test_slow_store_times_out_as_miss() {
        let cache = TokenCache::new(
            Arc::new(crate::testing::StalledStore),
            TokenCacheConfig::default(),
        );

        assert_eq!(cache.get("Bearer abc").await, None);
    }
}
