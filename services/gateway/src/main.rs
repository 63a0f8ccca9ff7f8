use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::cache::{CacheStore, RedisConfig, RedisPool};
use gateway::{
    AppState, EdgeAuthenticator,
    client::HttpAuthClient,
    config::GatewayConfig,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    routes,
    token_cache::{TokenCache, TokenCacheConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting gateway");

    let config = GatewayConfig::from_env()?;

    // Initialize Redis connection
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    // The edge degrades when Redis is down, so a failed check is not fatal
    match redis_pool.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        Ok(false) | Err(_) => warn!("Redis unavailable, edge cache and rate limiter will degrade"),
    }

    let store: Arc<dyn CacheStore> = Arc::new(redis_pool);

    let limiter = RateLimiter::new(
        store.clone(),
        RateLimiterConfig {
            max_requests: config.rate_limit_max_requests,
            window: config.rate_limit_window,
            timeout: config.cache_timeout,
            ..RateLimiterConfig::default()
        },
    );
    let cache = TokenCache::new(
        store,
        TokenCacheConfig {
            ttl: config.token_cache_ttl,
            timeout: config.cache_timeout,
        },
    );
    let client = HttpAuthClient::new(config.auth_service_url.clone(), config.auth_timeout)?;

    let app_state = AppState {
        edge: EdgeAuthenticator::new(limiter, cache, Arc::new(client)),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Gateway listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
    })
    .await?;

    Ok(())
}
