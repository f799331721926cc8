//! Instrumented in-memory cache backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::backend::CacheBackend;
use super::error::{CacheError, CacheResult};

#[derive(Default)]
struct MockState {
    entries: RwLock<HashMap<String, (String, Duration)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    delay: RwLock<Option<Duration>>,
}

/// Cache backend that counts calls and can be told to fail or stall.
///
/// Clones share state, so a test can keep one handle while the processor owns another.
#[derive(Clone, Default)]
pub struct MockCacheBackend {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCacheBackend")
            .field("reads", &self.reads())
            .field("writes", &self.writes())
            .finish_non_exhaustive()
    }
}

impl MockCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `get`/`ping` fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every `set_ex` fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every call sleep before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.state.delay.write().expect("lock poisoned") = delay;
    }

    /// Stores a raw value directly, bypassing counters.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.state
            .entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), (value.to_string(), Duration::MAX));
    }

    /// Returns the raw stored value, bypassing counters.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state
            .entries
            .read()
            .expect("lock poisoned")
            .get(key)
            .map(|(v, _)| v.clone())
    }

    /// Returns the TTL an entry was written with.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.state
            .entries
            .read()
            .expect("lock poisoned")
            .get(key)
            .map(|(_, ttl)| *ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        self.state
            .entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Number of `get` calls.
    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    /// Number of `set_ex` calls.
    pub fn writes(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    async fn maybe_delay(&self) {
        let delay = *self.state.delay.read().expect("lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl CacheBackend for MockCacheBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend {
                reason: "mock read failure".to_string(),
            });
        }
        Ok(self.raw(key))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        self.maybe_delay().await;
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend {
                reason: "mock write failure".to_string(),
            });
        }
        self.state
            .entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend {
                reason: "mock ping failure".to_string(),
            });
        }
        Ok(())
    }
}
