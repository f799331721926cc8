//! End-to-end query pipeline tests over the public API.

mod common;

use std::convert::Infallible;
use std::time::Duration;

use futures::StreamExt;
use futures::channel::mpsc;
use serde_json::{Value, json};

use phrasal::cache::{CacheBackend, CacheStore, MemoryBackend, SemanticCache, SemanticCacheConfig};
use phrasal::corpus::{LoadError, VectorStore};
use phrasal::embedding::{EmbeddingBackend, EmbeddingClient, EmbeddingConfig, MockEmbedder};
use phrasal::gateway::{Inbound, ServerMessage};
use phrasal::query::{ErrorCode, QueryConfig, QueryProcessor, QueryRequest};

use common::harness::{TestState, mock_state};

async fn converse(state: &TestState, frames: Vec<Value>) -> Vec<Value> {
    let (in_tx, in_rx) = mpsc::unbounded::<Result<Inbound, Infallible>>();
    let (out_tx, out_rx) = mpsc::unbounded::<String>();
    for frame in frames {
        in_tx
            .unbounded_send(Ok(Inbound::Text(frame.to_string())))
            .unwrap();
    }
    drop(in_tx);

    state.connection_handler().run(in_rx, out_tx).await;
    out_rx
        .map(|raw| serde_json::from_str(&raw).unwrap())
        .collect()
        .await
}

#[test]
fn test_corpus_loads_from_file() {
    let file = common::corpus_file();
    let store = VectorStore::load(file.path()).unwrap();
    assert_eq!(store.len(), 4);
    assert_eq!(store.dimension(), 2);
    assert_eq!(store.get("thanks-2").unwrap().translation, None);
    assert!(store.get("thanks-2").unwrap().tags.is_empty());
}

#[test]
fn test_missing_corpus_is_fatal() {
    let err = VectorStore::load("/nonexistent/vectors.json").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[tokio::test]
async fn test_query_then_cache_hit_over_connection() {
    let file = common::corpus_file();
    let (state, embedder, cache) = mock_state(VectorStore::load(file.path()).unwrap(), 0);
    embedder.script("good morning", vec![1.0, 0.0]);
    embedder.script("good morning!", vec![0.999, 0.001]);

    let replies = converse(
        &state,
        vec![json!({"type": "query", "text": "good morning", "k": 2})],
    )
    .await;
    assert_eq!(replies[0]["type"], "welcome");
    let first = replies[1].clone();
    assert_eq!(first["type"], "result");
    assert_eq!(first["source"], "search");
    assert_eq!(first["data"][0]["id"], "greet-1");
    assert_eq!(first["data"][0]["trans"], "좋은 아침");
    assert_eq!(first["data"][1]["id"], "greet-2");
    assert_eq!(cache.writes(), 1);

    let replies = converse(
        &state,
        vec![json!({"type": "query", "text": "good morning!", "k": 2})],
    )
    .await;
    assert_eq!(replies[1], first);
    assert_eq!(cache.reads(), 2);
    assert_eq!(cache.writes(), 1);
}

#[tokio::test]
async fn test_cache_outage_keeps_serving() {
    let file = common::corpus_file();
    let (state, embedder, cache) = mock_state(VectorStore::load(file.path()).unwrap(), 0);
    embedder.script("thanks", vec![0.0, 1.0]);
    cache.fail_reads(true);
    cache.fail_writes(true);

    let replies = converse(&state, vec![json!({"type": "query", "text": "thanks", "k": 1})]).await;
    assert_eq!(replies[1]["type"], "result");
    assert_eq!(replies[1]["data"][0]["id"], "thanks-1");
}

#[tokio::test]
async fn test_embedding_failure_reports_details() {
    let file = common::corpus_file();
    let (state, embedder, cache) = mock_state(VectorStore::load(file.path()).unwrap(), 0);
    embedder.fail(true);

    let replies = converse(&state, vec![json!({"type": "query", "text": "hello"})]).await;
    assert_eq!(replies[1]["type"], "error");
    assert_eq!(replies[1]["error"], "embedding_failed");
    assert!(replies[1]["details"].as_str().unwrap().contains("503"));
    assert_eq!(cache.reads(), 0);
    assert_eq!(cache.writes(), 0);
}

#[tokio::test]
async fn test_memory_store_with_stub_embedder() {
    let file = common::corpus_file();
    let store = VectorStore::load(file.path()).unwrap();
    let embedder = EmbeddingBackend::from_config(&EmbeddingConfig::stub(store.dimension())).unwrap();
    let cache_store = CacheStore::from_url("memory://").unwrap();
    assert_eq!(cache_store.name(), "memory");

    let processor = QueryProcessor::new(
        embedder,
        SemanticCache::new(cache_store, SemanticCacheConfig::default()),
        store,
        QueryConfig::default(),
    );

    let first = processor
        .handle(QueryRequest::search("hello").unwrap())
        .await
        .unwrap();
    let outcome = processor
        .process(QueryRequest::search("hello").unwrap())
        .await;
    assert!(outcome.cache_hit);
    assert_eq!(outcome.result.unwrap(), first);
    assert_eq!(first.data.len(), 4);
}

#[tokio::test]
async fn test_memory_backend_respects_ttl() {
    let cache = SemanticCache::new(
        MemoryBackend::new(),
        SemanticCacheConfig {
            ttl: Duration::from_millis(50),
            ..SemanticCacheConfig::default()
        },
    );
    let key = cache.quantize(&[0.5, 0.5]);
    assert!(cache.put(&key, &phrasal::CacheEntry::search(vec![])).await);
    assert!(cache.get(&key).await.is_some());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(cache.get(&key).await.is_none());
}

#[test]
fn test_server_message_from_error() {
    let message = ServerMessage::error(ErrorCode::LlmFallbackModeNotImplemented);
    let value: Value = serde_json::from_str(&message.to_json()).unwrap();
    assert_eq!(
        value,
        json!({"type": "error", "error": "llm_fallback_mode_not_implemented"})
    );
}

#[tokio::test]
async fn test_mock_embedder_direct() {
    let embedder = MockEmbedder::new(3);
    let backend = EmbeddingBackend::Mock(embedder.clone());
    assert_eq!(backend.embed("x").await.unwrap().len(), 3);
    assert_eq!(embedder.calls(), 1);
}
