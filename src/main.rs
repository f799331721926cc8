//! Phrasal server entrypoint.

use std::net::SocketAddr;

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use phrasal::cache::{CacheStore, SemanticCache};
use phrasal::config::Config;
use phrasal::constants::validate_embedding_dim;
use phrasal::corpus::VectorStore;
use phrasal::embedding::{EmbeddingBackend, EmbeddingClient};
use phrasal::gateway::{AppState, create_router_with_state};
use phrasal::query::{QueryConfig, QueryProcessor};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        embedding_backend = %config.embedding_backend,
        "Phrasal starting"
    );

    let store = VectorStore::load(&config.vectors_path)
        .with_context(|| format!("loading corpus from {}", config.vectors_path.display()))?;

    let embedder = EmbeddingBackend::from_config(&config.embedding_config(store.dimension()))?;
    if let Some(http) = embedder.as_http() {
        match http.health().await {
            Ok(health) => tracing::info!(
                url = http.base_url(),
                status = %health.status,
                model = health.model.as_deref().unwrap_or("unknown"),
                model_loaded = ?health.model_loaded,
                "Embedding service is reachable"
            ),
            Err(e) => tracing::warn!(
                url = http.base_url(),
                error = %e,
                "Embedding service health check failed, continuing"
            ),
        }
    }
    if let Some(dim) = embedder.dimension() {
        validate_embedding_dim(dim, store.dimension())
            .context("embedding backend does not match corpus dimension")?;
    }

    let cache_store = CacheStore::from_url(&config.cache_url)?;
    let cache = SemanticCache::new(cache_store, config.cache_config());
    if !cache.is_available().await {
        tracing::warn!(
            url = %config.cache_url,
            "Cache backend unreachable, serving without cache until it recovers"
        );
    }

    let processor = QueryProcessor::new(
        embedder,
        cache,
        store,
        QueryConfig {
            min_score: config.min_score,
        },
    );
    let state = AppState::new(processor, config.max_in_flight);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Phrasal shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
