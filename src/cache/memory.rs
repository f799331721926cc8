//! Process-local cache backend.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;

use super::backend::CacheBackend;
use super::error::CacheResult;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process moka cache with per-entry TTL. Not shared between processes.
#[derive(Clone)]
pub struct MemoryBackend {
    entries: Cache<String, StoredValue>,
}

impl MemoryBackend {
    const DEFAULT_CAPACITY: u64 = 100_000;

    /// Creates a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a store with a max entry capacity.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Returns the number of live entries (after pending maintenance).
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).map(|stored| stored.value))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), StoredValue { value, ttl });
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
