use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::constants::DEFAULT_CACHE_TTL_SECS;

use super::backend::CacheBackend;
use super::entry::{CacheEntry, StoredFormat};
use super::error::{CacheError, CacheResult};
use super::quantize::{QuantizedKey, Quantizer};

/// Settings for [`SemanticCache`].
#[derive(Debug, Clone)]
pub struct SemanticCacheConfig {
    pub quantizer: Quantizer,
    pub ttl: Duration,
    pub timeout: Duration,
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            quantizer: Quantizer::default(),
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            timeout: Duration::from_millis(250),
        }
    }
}

/// Best-effort result cache keyed by quantized query vectors.
///
/// Nothing here fails a request: every backend error, timeout or unreadable
/// payload degrades to a miss on read and to a dropped write on put.
pub struct SemanticCache<B: CacheBackend> {
    backend: B,
    config: SemanticCacheConfig,
}

impl<B: CacheBackend> std::fmt::Debug for SemanticCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCache")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl<B: CacheBackend> SemanticCache<B> {
    pub fn new(backend: B, config: SemanticCacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Projects a vector onto its bucket key.
    #[inline]
    pub fn quantize(&self, vector: &[f32]) -> QuantizedKey {
        self.config.quantizer.quantize(vector)
    }

    /// Looks up a bucket. Errors and timeouts are logged and reported as `None`.
    #[instrument(skip(self, key), fields(backend = self.backend.name()))]
    pub async fn get(&self, key: &QuantizedKey) -> Option<CacheEntry> {
        let storage_key = key.storage_key();

        let raw = match self
            .with_timeout("get", self.backend.get(&storage_key))
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache get failed, treating as miss");
                return None;
            }
        };

        match CacheEntry::decode(&raw) {
            Ok((entry, format)) => {
                if format != StoredFormat::Versioned {
                    debug!(key = %key, ?format, "Migrated cache entry from older format");
                }
                debug!(key = %key, results = entry.data.len(), source = %entry.source, "Cache hit");
                Some(entry)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    /// Stores an entry under a bucket with the configured TTL.
    ///
    /// Returns whether the write was acknowledged; callers are free to ignore it.
    #[instrument(skip(self, key, entry), fields(backend = self.backend.name()))]
    pub async fn put(&self, key: &QuantizedKey, entry: &CacheEntry) -> bool {
        let payload = match entry.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache entry serialization failed");
                return false;
            }
        };

        let storage_key = key.storage_key();
        match self
            .with_timeout(
                "set",
                self.backend.set_ex(&storage_key, payload, self.config.ttl),
            )
            .await
        {
            Ok(()) => {
                debug!(key = %key, ttl_secs = self.config.ttl.as_secs(), "Cache entry stored");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache put failed, continuing without caching");
                false
            }
        }
    }

    /// `true` if the backend answers a ping within the timeout.
    pub async fn is_available(&self) -> bool {
        self.with_timeout("ping", self.backend.ping()).await.is_ok()
    }

    async fn with_timeout<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout {
                operation,
                after: self.config.timeout,
            })?
    }
}
