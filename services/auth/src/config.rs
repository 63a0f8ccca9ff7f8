//! Session authority configuration

use anyhow::Result;
use chrono::Duration;
use std::env;

use crate::jwt::MIN_SECRET_LEN;

/// Session authority configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for signing tokens
    pub jwt_secret: String,
    /// Session lifetime (default: 24 hours)
    pub session_ttl: Duration,
    /// Window after expiry during which refresh is still allowed (default: 2 minutes)
    pub grace_period: Duration,
    /// Deadline for every session/user store call
    pub store_timeout: std::time::Duration,
    /// Cron expression for the session janitor (default: hourly)
    pub janitor_schedule: String,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Service name stamped on audit events
    pub service_name: String,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Token signing secret, at least 32 bytes (required)
    /// - `SESSION_TTL_SECONDS`: Session lifetime in seconds (default: 86400)
    /// - `SESSION_GRACE_SECONDS`: Refresh grace period in seconds (default: 120)
    /// - `STORE_TIMEOUT_MS`: Store call deadline in milliseconds (default: 2000)
    /// - `JANITOR_SCHEDULE`: Cron schedule for expired session cleanup (default: "0 0 * * * *")
    /// - `AUTH_BIND_ADDR`: Listen address (default: "0.0.0.0:3000")
    /// - `SERVICE_NAME`: Audit service name (default: "auth-service")
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} bytes", MIN_SECRET_LEN);
        }

        let session_ttl = env::var("SESSION_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string()) // 24 hours
            .parse()
            .unwrap_or(86400);

        let grace_period = env::var("SESSION_GRACE_SECONDS")
            .unwrap_or_else(|_| "120".to_string()) // 2 minutes
            .parse()
            .unwrap_or(120);

        let store_timeout = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .unwrap_or(2000);

        let janitor_schedule =
            env::var("JANITOR_SCHEDULE").unwrap_or_else(|_| "0 0 * * * *".to_string());

        let bind_addr = env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "auth-service".to_string());

        Ok(AuthConfig {
            jwt_secret,
            session_ttl: Duration::seconds(session_ttl),
            grace_period: Duration::seconds(grace_period),
            store_timeout: std::time::Duration::from_millis(store_timeout),
            janitor_schedule,
            bind_addr,
            service_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    #[serial]
    fn test_auth_config_defaults() {
        unsafe {
            env::set_var("JWT_SECRET", SECRET);
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.session_ttl, Duration::hours(24));
        assert_eq!(config.grace_period, Duration::minutes(2));
        assert_eq!(config.store_timeout, std::time::Duration::from_secs(2));
        assert_eq!(config.janitor_schedule, "0 0 * * * *");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");

        unsafe {
            env::remove_var("JWT_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_auth_config_custom_values() {
        unsafe {
            env::set_var("JWT_SECRET", SECRET);
            env::set_var("SESSION_TTL_SECONDS", "3600");
            env::set_var("SESSION_GRACE_SECONDS", "30");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.session_ttl, Duration::hours(1));
        assert_eq!(config.grace_period, Duration::seconds(30));

        unsafe {
            env::remove_var("JWT_SECRET");
            env::remove_var("SESSION_TTL_SECONDS");
            env::remove_var("SESSION_GRACE_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn test_auth_config_rejects_missing_or_short_secret() {
        unsafe {
            env::remove_var("JWT_SECRET");
        }
        assert!(AuthConfig::from_env().is_err());

        unsafe {
            env::set_var("JWT_SECRET", "too-short");
        }
        assert!(AuthConfig::from_env().is_err());

        unsafe {
            env::remove_var("JWT_SECRET");
        }
    }
}
