//! Test server harness.

use std::net::SocketAddr;
use std::time::Duration;

use phrasal::cache::{CacheStore, MockCacheBackend, SemanticCache, SemanticCacheConfig};
use phrasal::corpus::VectorStore;
use phrasal::embedding::{EmbeddingBackend, MockEmbedder};
use phrasal::gateway::{AppState, create_router_with_state};
use phrasal::query::{QueryConfig, QueryProcessor};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub type TestState = AppState<EmbeddingBackend, CacheStore>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub embedder: MockEmbedder,
    pub cache: MockCacheBackend,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Builds application state over a corpus with mock embedding and cache backends.
pub fn mock_state(store: VectorStore, max_in_flight: usize) -> (TestState, MockEmbedder, MockCacheBackend) {
    let embedder = MockEmbedder::new(store.dimension());
    let cache = MockCacheBackend::new();

    let processor = QueryProcessor::new(
        EmbeddingBackend::Mock(embedder.clone()),
        SemanticCache::new(
            CacheStore::Mock(cache.clone()),
            SemanticCacheConfig {
                timeout: Duration::from_millis(100),
                ..SemanticCacheConfig::default()
            },
        ),
        store,
        QueryConfig::default(),
    );

    (AppState::new(processor, max_in_flight), embedder, cache)
}

/// Serves the full router on an ephemeral port.
pub async fn spawn_test_server(store: VectorStore) -> std::io::Result<TestServer> {
    let (state, embedder, cache) = mock_state(store, 0);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    Ok(TestServer {
        addr,
        embedder,
        cache,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}
