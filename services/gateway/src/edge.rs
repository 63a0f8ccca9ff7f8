//! Edge authentication: rate limit, cached verdict, then the authority

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    client::AuthClient,
    error::{GatewayError, GatewayResult},
    policy::FailurePolicy,
    rate_limiter::RateLimiter,
    token_cache::TokenCache,
};

/// Gatekeeper run in front of every protected request
#[derive(Clone)]
pub struct EdgeAuthenticator {
    limiter: RateLimiter,
    cache: TokenCache,
    client: Arc<dyn AuthClient>,
    upstream_failure: FailurePolicy,
}

impl EdgeAuthenticator {
    /// Create an authenticator that denies requests when the authority fails
    pub fn new(limiter: RateLimiter, cache: TokenCache, client: Arc<dyn AuthClient>) -> Self {
        Self {
            limiter,
            cache,
            client,
            upstream_failure: FailurePolicy::Closed,
        }
    }

    /// Override the answer given when the authority cannot be reached
    pub fn with_upstream_failure(mut self, policy: FailurePolicy) -> Self {
        self.upstream_failure = policy;
        self
    }

    /// Reject the caller when its rate limit window is exhausted
    pub async fn check_rate(&self, client_key: &str) -> GatewayResult<()> {
        if self.limiter.is_limited(client_key).await {
            return Err(GatewayError::RateLimited {
                retry_after: self.limiter.window(),
            });
        }
        Ok(())
    }

    /// Reject the request unless `authorization` carries a valid token
    pub async fn authenticate(&self, authorization: Option<&str>) -> GatewayResult<()> {
        let authorization = authorization
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(GatewayError::Unauthorized)?;

        if self.verify(authorization).await {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }

    /// Full edge check: rate limit first, then authentication
    pub async fn authorize(
        &self,
        client_key: &str,
        authorization: Option<&str>,
    ) -> GatewayResult<()> {
        self.check_rate(client_key).await?;
        self.authenticate(authorization).await
    }

    /// Verdict for the raw `Authorization` value, served from cache when possible
    pub async fn verify(&self, authorization: &str) -> bool {
        if let Some(verdict) = self.cache.get(authorization).await {
            debug!("Token verdict served from cache");
            return verdict;
        }

        match self.client.verify_token(authorization).await {
            Ok(verdict) => {
                self.cache.put(authorization, verdict).await;
                verdict
            }
            Err(e) => {
                let verdict = self.upstream_failure.permits();
                warn!("Token verification failed upstream, verdict={}: {}", verdict, e);
                if !verdict {
                    // Keep repeated failures off the authority
                    self.cache.put(authorization, false).await;
                }
                verdict
            }
        }
    }

    /// Revoke the session upstream and forget its cached verdict
    pub async fn logout(&self, authorization: &str) -> GatewayResult<()> {
        let result = self.client.logout(authorization).await;
        self.cache.invalidate(authorization).await;
        result
    }
}
