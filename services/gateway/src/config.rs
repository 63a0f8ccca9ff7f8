//! Gateway configuration

use anyhow::Result;
use std::env;
use std::time::Duration;

/// Edge gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the session authority
    pub auth_service_url: String,
    /// Lifetime of a cached verdict (default: 15 minutes)
    pub token_cache_ttl: Duration,
    /// Requests allowed per client per window (default: 100)
    pub rate_limit_max_requests: u64,
    /// Rate limit window length (default: 1 minute)
    pub rate_limit_window: Duration,
    /// Deadline for every cache store call
    pub cache_timeout: Duration,
    /// Deadline for calls into the session authority
    pub auth_timeout: Duration,
    /// Address the HTTP server binds to
    pub bind_addr: String,
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl GatewayConfig {
    /// Create a new GatewayConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_SERVICE_URL`: Session authority base URL (default: "http://localhost:3000")
    /// - `TOKEN_CACHE_TTL_SECONDS`: Verdict cache TTL (default: 900)
    /// - `RATE_LIMIT_MAX_REQUESTS`: Requests per window (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECONDS`: Window length (default: 60)
    /// - `CACHE_TIMEOUT_MS`: Cache call deadline (default: 250)
    /// - `AUTH_TIMEOUT_MS`: Authority call deadline (default: 2000)
    /// - `GATEWAY_BIND_ADDR`: Listen address (default: "0.0.0.0:3001")
    pub fn from_env() -> Result<Self> {
        let auth_service_url = env::var("AUTH_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let rate_limit_max_requests = env_u64("RATE_LIMIT_MAX_REQUESTS", 100);
        if rate_limit_max_requests == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_REQUESTS must be positive");
        }

        Ok(GatewayConfig {
            auth_service_url,
            token_cache_ttl: Duration::from_secs(env_u64("TOKEN_CACHE_TTL_SECONDS", 900)),
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(env_u64("RATE_LIMIT_WINDOW_SECONDS", 60)),
            cache_timeout: Duration::from_millis(env_u64("CACHE_TIMEOUT_MS", 250)),
            auth_timeout: Duration::from_millis(env_u64("AUTH_TIMEOUT_MS", 2000)),
            bind_addr: env::var("GATEWAY_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
        })
    }
}
