//! Fixed-window rate limiter for the edge
//!
//! Each client key gets its own window, opened by the first request seen for
//! that key. The counter and its TTL are created together with a single
//! set-if-absent call so a window is never left without an expiry.

use common::cache::{CacheStore, with_timeout};
use common::error::CacheResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::policy::FailurePolicy;

const KEY_PREFIX: &str = "ratelimit:";

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u64,
    /// Window length
    pub window: Duration,
    /// Deadline for every store call
    pub timeout: Duration,
    /// Answer given when the store cannot be reached
    pub on_store_error: FailurePolicy,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            timeout: Duration::from_millis(250),
            on_store_error: FailurePolicy::Open,
        }
    }
}

/// Rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    /// Rate limiter configuration
    config: RateLimiterConfig,
    /// Shared counter store
    store: Arc<dyn CacheStore>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(store: Arc<dyn CacheStore>, config: RateLimiterConfig) -> Self {
        Self { config, store }
    }

    /// Check whether `client_key` has used up its budget for the current window
    ///
    /// Requests that are let through are counted; rejected requests are not.
    pub async fn is_limited(&self, client_key: &str) -> bool {
        match self.count(client_key).await {
            Ok(limited) => limited,
            Err(e) => {
                let limited = !self.config.on_store_error.permits();
                warn!(
                    "Rate limiter store unavailable for {}, limited={}: {}",
                    client_key, limited, e
                );
                limited
            }
        }
    }

    async fn count(&self, client_key: &str) -> CacheResult<bool> {
        let key = format!("{}{}", KEY_PREFIX, client_key);
        let timeout = self.config.timeout;

        if with_timeout(
            timeout,
            self.store.set_if_absent(&key, "1", self.config.window),
        )
        .await?
        {
            return Ok(false);
        }

        // The window may have lapsed between the two calls; a missing counter
        // is a fresh window and the increment below recreates it with a TTL
        let current = with_timeout(timeout, self.store.get(&key))
            .await?
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);

        if current >= self.config.max_requests {
            info!("Rate limit reached for {}", client_key);
            return Ok(true);
        }

        with_timeout(timeout, self.store.increment(&key, self.config.window)).await?;
        Ok(false)
    }

    /// Length of one rate limit window
    pub fn window(&self) -> Duration {
        self.config.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StalledStore, UnreachableStore};
    use common::cache::MemoryStore;
    use common::clock::ManualClock;

    fn limiter() -> (RateLimiter, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        (RateLimiter::new(store, RateLimiterConfig::default()), clock)
    }

    #[tokio::test]
    async fn test_hundred_allowed_then_limited() {
        let (limiter, _clock) = limiter();

        for i in 1..=100 {
            assert!(!limiter.is_limited("10.0.0.1").await, "request {} limited", i);
        }
        assert!(limiter.is_limited("10.0.0.1").await);
        assert!(limiter.is_limited("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let (limiter, clock) = limiter();

        for _ in 0..101 {
            limiter.is_limited("10.0.0.1").await;
        }
        assert!(limiter.is_limited("10.0.0.1").await);

        clock.advance(chrono::Duration::seconds(60));
        assert!(!limiter.is_limited("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_window_starts_at_first_request_per_key() {
        let (limiter, clock) = limiter();

        for _ in 0..100 {
            limiter.is_limited("a").await;
        }
        clock.advance(chrono::Duration::seconds(30));
        for _ in 0..100 {
            limiter.is_limited("b").await;
        }

        // Key `a` opened its window 60s ago, key `b` only 30s ago
        clock.advance(chrono::Duration::seconds(30));
        assert!(!limiter.is_limited("a").await);
        assert!(limiter.is_limited("b").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (limiter, _clock) = limiter();

        for _ in 0..100 {
            limiter.is_limited("a").await;
        }
        assert!(limiter.is_limited("a").await);
        assert!(!limiter.is_limited("b").await);
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_open() {
        let limiter = RateLimiter::new(Arc::new(UnreachableStore), RateLimiterConfig::default());
        for _ in 0..200 {
            assert!(!limiter.is_limited("10.0.0.1").await);
        }
    }

    #[tokio::test]
    async fn test_closed_policy_limits_on_store_error() {
        let config = RateLimiterConfig {
            on_store_error: FailurePolicy::Closed,
            ..RateLimiterConfig::default()
        };
        let limiter = RateLimiter::new(Arc::new(UnreachableStore), config);
        assert!(limiter.is_limited("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_stalled_store_fails_open() {
        let limiter = RateLimiter::new(Arc::new(StalledStore), RateLimiterConfig::default());
        assert!(!limiter.is_limited("10.0.0.1").await);
    }
}
