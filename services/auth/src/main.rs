use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{
    AppState, SessionAuthority, SessionSettings,
    config::AuthConfig,
    janitor::SessionJanitor,
    jwt::TokenCodec,
    repositories::{PgSessionStore, PgUserStore},
    routes,
};
use common::database::{self, DatabaseConfig};
use common::error::DatabaseError;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting authentication service");

    let config = AuthConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    let codec = TokenCodec::new(config.jwt_secret.as_bytes())?;
    let settings = SessionSettings::from(&config);
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(pool));

    let janitor = SessionJanitor::new(sessions.clone(), &settings);
    let janitor_handle = janitor.start(&config.janitor_schedule).await?;

    let authority = SessionAuthority::new(users, sessions, codec, settings);
    let app = routes::create_router(AppState { authority });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Authentication service listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down authentication service");
        })
        .await?;

    janitor_handle.shutdown().await?;

    Ok(())
}
