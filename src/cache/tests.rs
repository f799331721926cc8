use std::time::Duration;

use super::*;
use crate::ranking::ScoredResult;

fn sample_results() -> Vec<ScoredResult> {
    vec![
        ScoredResult {
            id: "p1".to_string(),
            text: "good morning".to_string(),
            translation: Some("bonjour".to_string()),
            tags: vec!["greeting".to_string()],
            score: 0.98,
        },
        ScoredResult {
            id: "p2".to_string(),
            text: "good night".to_string(),
            translation: None,
            tags: vec![],
            score: 0.71,
        },
    ]
}

fn mock_cache(timeout: Duration) -> (SemanticCache<MockCacheBackend>, MockCacheBackend) {
    let backend = MockCacheBackend::new();
    let cache = SemanticCache::new(
        backend.clone(),
        SemanticCacheConfig {
            quantizer: Quantizer::default(),
            ttl: Duration::from_secs(3600),
            timeout,
        },
    );
    (cache, backend)
}

#[test]
fn test_quantize_is_deterministic() {
    let q = Quantizer::default();
    let v = [0.123_f32, -0.456, 0.789, 0.0, 0.5, -0.5, 0.25, 0.75, 0.9];
    assert_eq!(q.quantize(&v), q.quantize(&v));
}

#[test]
fn test_quantize_uses_prefix_and_decimals() {
    let q = Quantizer::new(2, 3);
    let key = q.quantize(&[0.123, -0.456, 0.789, 0.999]);
    assert_eq!(key.as_str(), "0.12,-0.46,0.79");
    assert_eq!(key.storage_key(), "semcache:0.12,-0.46,0.79");
    assert_eq!(key.to_string(), key.as_str());
}

#[test]
fn test_quantize_ignores_components_past_prefix() {
    let q = Quantizer::new(2, 2);
    let a = q.quantize(&[0.1, 0.2, 0.3]);
    let b = q.quantize(&[0.1, 0.2, -0.9]);
    assert_eq!(a, b);
}

#[test]
fn test_quantize_collides_within_rounding() {
    let q = Quantizer::new(2, 2);
    assert_eq!(q.quantize(&[0.101, 0.2]), q.quantize(&[0.104, 0.2]));
    assert_ne!(q.quantize(&[0.10, 0.2]), q.quantize(&[0.12, 0.2]));
}

#[test]
fn test_quantize_keeps_sign_of_small_negatives() {
    let q = Quantizer::new(2, 2);
    assert_eq!(q.quantize(&[-0.001, 0.5]).as_str(), "-0.00,0.50");
    assert_ne!(q.quantize(&[-0.001, 0.5]), q.quantize(&[0.001, 0.5]));
    assert_eq!(q.quantize(&[-0.0, 0.5]).as_str(), "0.00,0.50");
    assert_eq!(q.quantize(&[-0.01, 0.5]).as_str(), "-0.01,0.50");
}

#[test]
fn test_quantize_rounds_exact_ties_away_from_zero() {
    let q = Quantizer::new(2, 8);
    assert_eq!(
        q.quantize(&[0.125, 0.375, -0.125, 0.625]).as_str(),
        "0.13,0.38,-0.13,0.63"
    );
    // Not a tie in binary: 0.115f32 is slightly above 0.115.
    assert_eq!(q.quantize(&[0.115]).as_str(), "0.12");
    // 0.145f32 is slightly below 0.145.
    assert_eq!(q.quantize(&[0.145]).as_str(), "0.14");
    assert_eq!(Quantizer::new(0, 2).quantize(&[0.5, 2.5]).as_str(), "1,3");
}

#[test]
fn test_quantize_short_vector_uses_all_components() {
    let q = Quantizer::new(1, 8);
    assert_eq!(q.quantize(&[0.25, 0.75]).as_str(), "0.3,0.8");
}

#[test]
fn test_entry_encode_writes_versioned_envelope() {
    let entry = CacheEntry::search(sample_results());
    let raw = entry.encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["v"], ENVELOPE_VERSION);
    assert_eq!(value["source"], "search");
    assert_eq!(value["data"][0]["id"], "p1");
    assert_eq!(value["data"][0]["trans"], "bonjour");

    let (decoded, format) = CacheEntry::decode(&raw).unwrap();
    assert_eq!(decoded, entry);
    assert_eq!(format, StoredFormat::Versioned);
}

#[test]
fn test_entry_decode_migrates_legacy_array() {
    let raw = r#"[{"id":"p1","text":"good morning","trans":"bonjour","tags":["greeting"],"score":0.9}]"#;
    let (entry, format) = CacheEntry::decode(raw).unwrap();
    assert_eq!(format, StoredFormat::Legacy);
    assert_eq!(entry.source, ResultSource::Search);
    assert_eq!(entry.data.len(), 1);
    assert_eq!(entry.data[0].translation.as_deref(), Some("bonjour"));
}

#[test]
fn test_entry_decode_migrates_unversioned_object() {
    let raw = r#"{"source":"llm","data":[{"id":"x","text":"hi","score":1.0}]}"#;
    let (entry, format) = CacheEntry::decode(raw).unwrap();
    assert_eq!(format, StoredFormat::Unversioned);
    assert_eq!(entry.source, ResultSource::Llm);
    assert!(entry.data[0].tags.is_empty());
}

#[test]
fn test_entry_decode_rejects_unknown_version() {
    let raw = r#"{"v":7,"source":"search","data":[]}"#;
    let err = CacheEntry::decode(raw).unwrap_err();
    assert!(matches!(err, CacheError::Envelope { .. }));
}

#[test]
fn test_entry_decode_rejects_garbage() {
    for raw in ["not json", "42", r#"{"foo":1}"#, r#"{"source":"web","data":[]}"#] {
        assert!(
            matches!(CacheEntry::decode(raw), Err(CacheError::Envelope { .. })),
            "accepted {raw}"
        );
    }
}

#[test]
fn test_store_from_url() {
    assert!(matches!(
        CacheStore::from_url("redis://localhost:6379").unwrap(),
        CacheStore::Redis(_)
    ));
    assert!(matches!(
        CacheStore::from_url("memory://").unwrap(),
        CacheStore::Memory(_)
    ));
    assert!(matches!(
        CacheStore::from_url("mock://").unwrap(),
        CacheStore::Mock(_)
    ));
    assert!(matches!(
        CacheStore::from_url("memcached://localhost"),
        Err(CacheError::UnsupportedUrl { .. })
    ));
}

#[tokio::test]
async fn test_memory_backend_roundtrip() {
    let backend = MemoryBackend::new();
    assert!(backend.is_empty());
    backend
        .set_ex("k", "v".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
    assert_eq!(backend.get("missing").await.unwrap(), None);
    assert_eq!(backend.len(), 1);
    backend.ping().await.unwrap();
}

#[tokio::test]
async fn test_memory_backend_expires_entries() {
    let backend = MemoryBackend::new();
    backend
        .set_ex("short", "v".to_string(), Duration::from_millis(50))
        .await
        .unwrap();
    backend
        .set_ex("long", "v".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    std::thread::sleep(Duration::from_millis(150));

    assert_eq!(backend.get("short").await.unwrap(), None);
    assert_eq!(backend.get("long").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn test_semantic_cache_put_then_get() {
    let (cache, backend) = mock_cache(Duration::from_millis(250));
    let key = cache.quantize(&[0.1, 0.2, 0.3]);
    let entry = CacheEntry::search(sample_results());

    assert!(cache.get(&key).await.is_none());
    assert!(cache.put(&key, &entry).await);
    assert_eq!(cache.get(&key).await, Some(entry));

    assert_eq!(backend.keys(), vec![key.storage_key()]);
    assert_eq!(backend.ttl_of(&key.storage_key()), Some(Duration::from_secs(3600)));
}

#[tokio::test]
async fn test_semantic_cache_read_failure_is_miss() {
    let (cache, backend) = mock_cache(Duration::from_millis(250));
    let key = cache.quantize(&[0.1, 0.2]);
    cache.put(&key, &CacheEntry::search(sample_results())).await;

    backend.fail_reads(true);
    assert!(cache.get(&key).await.is_none());
    assert!(!cache.is_available().await);

    backend.fail_reads(false);
    assert!(cache.get(&key).await.is_some());
    assert!(cache.is_available().await);
}

#[tokio::test]
async fn test_semantic_cache_write_failure_is_swallowed() {
    let (cache, backend) = mock_cache(Duration::from_millis(250));
    backend.fail_writes(true);
    let key = cache.quantize(&[0.1, 0.2]);

    assert!(!cache.put(&key, &CacheEntry::search(sample_results())).await);
    assert_eq!(backend.writes(), 1);
    assert!(backend.keys().is_empty());
}

#[tokio::test]
async fn test_semantic_cache_timeout_is_miss() {
    let (cache, backend) = mock_cache(Duration::from_millis(20));
    let key = cache.quantize(&[0.1, 0.2]);
    backend.insert_raw(
        &key.storage_key(),
        &CacheEntry::search(sample_results()).encode().unwrap(),
    );
    backend.set_delay(Some(Duration::from_millis(200)));

    assert!(cache.get(&key).await.is_none());
    assert!(!cache.put(&key, &CacheEntry::search(vec![])).await);
}

#[tokio::test]
async fn test_semantic_cache_discards_corrupt_entry() {
    let (cache, backend) = mock_cache(Duration::from_millis(250));
    let key = cache.quantize(&[0.1, 0.2]);
    backend.insert_raw(&key.storage_key(), "{broken");

    assert!(cache.get(&key).await.is_none());
    assert_eq!(backend.reads(), 1);
}

#[tokio::test]
async fn test_semantic_cache_reads_legacy_entry() {
    let (cache, backend) = mock_cache(Duration::from_millis(250));
    let key = cache.quantize(&[0.1, 0.2]);
    let legacy = serde_json::to_string(&sample_results()).unwrap();
    backend.insert_raw(&key.storage_key(), &legacy);

    let entry = cache.get(&key).await.unwrap();
    assert_eq!(entry.source, ResultSource::Search);
    assert_eq!(entry.data, sample_results());
}
