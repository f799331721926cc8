use std::time::Duration;

use super::error::{CacheError, CacheResult};
use super::memory::MemoryBackend;
#[cfg(any(test, feature = "mock"))]
use super::mock::MockCacheBackend;
use super::redis_store::RedisBackend;

/// Key → string store with per-entry expiry, shared across processes.
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and readiness output.
    fn name(&self) -> &'static str;

    /// Reads a value; `Ok(None)` when absent or expired.
    fn get(&self, key: &str) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Writes a value that expires after `ttl`.
    fn set_ex(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Round-trips to the backend to check connectivity.
    fn ping(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;
}

/// Backend selected at startup from the configured URL.
#[derive(Debug, Clone)]
pub enum CacheStore {
    /// Shared Redis instance.
    Redis(RedisBackend),
    /// Process-local store.
    Memory(MemoryBackend),
    #[cfg(any(test, feature = "mock"))]
    /// Instrumented in-memory mock.
    Mock(MockCacheBackend),
}

impl CacheStore {
    /// Builds a backend from a URL (`mock://` URLs require the `mock` feature).
    ///
    /// Redis connections are established lazily, so an unreachable server does
    /// not prevent startup.
    pub fn from_url(url: &str) -> CacheResult<Self> {
        if url.starts_with("redis://") || url.starts_with("rediss://") {
            Ok(Self::Redis(RedisBackend::new(url)?))
        } else if url.starts_with("memory://") {
            Ok(Self::Memory(MemoryBackend::new()))
        } else if url.starts_with("mock://") {
            #[cfg(any(test, feature = "mock"))]
            {
                Ok(Self::Mock(MockCacheBackend::new()))
            }
            #[cfg(not(any(test, feature = "mock")))]
            {
                Err(CacheError::UnsupportedUrl {
                    url: url.to_string(),
                })
            }
        } else {
            Err(CacheError::UnsupportedUrl {
                url: url.to_string(),
            })
        }
    }
}

impl CacheBackend for CacheStore {
    fn name(&self) -> &'static str {
        match self {
            CacheStore::Redis(b) => b.name(),
            CacheStore::Memory(b) => b.name(),
            #[cfg(any(test, feature = "mock"))]
            CacheStore::Mock(b) => b.name(),
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            CacheStore::Redis(b) => b.get(key).await,
            CacheStore::Memory(b) => b.get(key).await,
            #[cfg(any(test, feature = "mock"))]
            CacheStore::Mock(b) => b.get(key).await,
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        match self {
            CacheStore::Redis(b) => b.set_ex(key, value, ttl).await,
            CacheStore::Memory(b) => b.set_ex(key, value, ttl).await,
            #[cfg(any(test, feature = "mock"))]
            CacheStore::Mock(b) => b.set_ex(key, value, ttl).await,
        }
    }

    async fn ping(&self) -> CacheResult<()> {
        match self {
            CacheStore::Redis(b) => b.ping().await,
            CacheStore::Memory(b) => b.ping().await,
            #[cfg(any(test, feature = "mock"))]
            CacheStore::Mock(b) => b.ping().await,
        }
    }
}
