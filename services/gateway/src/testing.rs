//! Cache stores that misbehave, for exercising the degradation paths

use async_trait::async_trait;
use common::cache::CacheStore;
use common::error::{CacheError, CacheResult};
use std::time::Duration;

fn refused() -> CacheError {
    CacheError::Backend(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

/// Every call fails as if the backend were down
pub struct UnreachableStore;

#[async_trait]
impl CacheStore for UnreachableStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(refused())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(refused())
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(refused())
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<bool> {
        Err(refused())
    }

    async fn increment(&self, _key: &str, _ttl: Duration) -> CacheResult<u64> {
        Err(refused())
    }
}

/// Every call hangs far beyond any configured deadline
pub struct StalledStore;

impl StalledStore {
    async fn stall<T>() -> CacheResult<T> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(refused())
    }
}

#[async_trait]
impl CacheStore for StalledStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Self::stall().await
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        Self::stall().await
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Self::stall().await
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<bool> {
        Self::stall().await
    }

    async fn increment(&self, _key: &str, _ttl: Duration) -> CacheResult<u64> {
        Self::stall().await
    }
}
