//! Common library for the auth platform
//!
//! This crate provides shared functionality used by the session authority
//! and the edge gateway: the key-value cache abstraction, database
//! connectivity, an injectable clock and the shared storage error types.

pub mod cache;
pub mod clock;
pub mod database;
pub mod error;

/// Example usage of the cache module
///
/// ```rust,no_run
/// use common::cache::{CacheStore, RedisConfig, RedisPool};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RedisConfig::from_env()?;
///     let pool = RedisPool::new(&config).await?;
///     pool.set("greeting", "hello", Some(Duration::from_secs(10))).await?;
///     println!("{:?}", pool.get("greeting").await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
