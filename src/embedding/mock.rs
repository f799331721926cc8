//! Scriptable embedder for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{EmbeddingClient, EmbeddingReadiness};
use super::error::EmbeddingError;
use super::stub::StubEmbedder;

struct MockState {
    scripted: RwLock<HashMap<String, Vec<f32>>>,
    fail: AtomicBool,
    delay: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    fallback: StubEmbedder,
}

/// Returns scripted vectors per text, falling back to stub vectors.
///
/// Clones share state.
#[derive(Clone)]
pub struct MockEmbedder {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEmbedder")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl MockEmbedder {
    /// Unscripted texts get stub vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            state: Arc::new(MockState {
                scripted: RwLock::new(HashMap::new()),
                fail: AtomicBool::new(false),
                delay: RwLock::new(None),
                calls: AtomicUsize::new(0),
                fallback: StubEmbedder::new(dimension.max(1)).expect("dimension is non-zero"),
            }),
        }
    }

    /// Returns `vector` whenever `text` is embedded.
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.script(text, vector);
        self
    }

    pub fn script(&self, text: &str, vector: Vec<f32>) {
        self.state
            .scripted
            .write()
            .expect("lock poisoned")
            .insert(text.to_string(), vector);
    }

    /// Makes every call fail with a provider error and readiness report `Unavailable`.
    pub fn fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.state.delay.write().expect("lock poisoned") = delay;
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingClient for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.delay.read().expect("lock poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Provider {
                status: 503,
                body: "mock embedding failure".to_string(),
            });
        }

        let scripted = self
            .state
            .scripted
            .read()
            .expect("lock poisoned")
            .get(text)
            .cloned();
        Ok(scripted.unwrap_or_else(|| self.state.fallback.embed_sync(text)))
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }

    async fn readiness(&self) -> EmbeddingReadiness {
        if self.state.fail.load(Ordering::SeqCst) {
            EmbeddingReadiness::Unavailable
        } else {
            EmbeddingReadiness::Ready
        }
    }
}
