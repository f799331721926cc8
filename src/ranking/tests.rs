use super::*;

fn store(vectors: &[(&str, &[f32])]) -> VectorStore {
    let records = vectors
        .iter()
        .map(|(id, v)| PhraseRecord::new(*id, format!("text {id}"), v.to_vec()))
        .collect();
    VectorStore::from_records(records).expect("test corpus should be valid")
}

fn ids(results: &[ScoredResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_cosine_identical_vectors() {
    let v = [1.0, 2.0, 3.0];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_orthogonal_vectors() {
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
}

#[test]
fn test_cosine_opposite_vectors() {
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_scaled_vectors() {
    assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_zero_vector_is_zero_not_nan() {
    let score = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]);
    assert!(!score.is_nan());
    assert_eq!(score, 0.0);
}

#[test]
fn test_dot_and_norm() {
    assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
    assert_eq!(norm(&[3.0, 4.0]), 5.0);
}

#[test]
fn test_top_k_reference_example() {
    let store = store(&[("a", &[1.0, 0.0]), ("b", &[0.9, 0.1])]);

    let results = ExactRanker::new().top_k(&[1.0, 0.0], &store, 1).unwrap();

    assert_eq!(ids(&results), vec!["a"]);
    assert!((results[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn test_top_k_orders_descending() {
    let store = store(&[
        ("far", &[0.0, 1.0]),
        ("near", &[1.0, 0.1]),
        ("mid", &[1.0, 1.0]),
    ]);

    let results = ExactRanker::new().top_k(&[1.0, 0.0], &store, 3).unwrap();

    assert_eq!(ids(&results), vec!["near", "mid", "far"]);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_top_k_returns_min_of_k_and_corpus_size() {
    let store = store(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0]), ("c", &[1.0, 1.0])]);
    let ranker = ExactRanker::new();

    for k in 1..=20 {
        let results = ranker.top_k(&[0.3, 0.7], &store, k).unwrap();
        assert_eq!(results.len(), k.min(store.len()), "k = {k}");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn test_ties_keep_corpus_order() {
    let store = store(&[
        ("first", &[1.0, 0.0]),
        ("other", &[0.0, 1.0]),
        ("second", &[2.0, 0.0]),
        ("third", &[0.5, 0.0]),
    ]);

    let results = ExactRanker::new().top_k(&[1.0, 0.0], &store, 3).unwrap();

    assert_eq!(ids(&results), vec!["first", "second", "third"]);
}

#[test]
fn test_dimension_mismatch_is_rejected() {
    let store = store(&[("a", &[1.0, 0.0])]);

    let err = ExactRanker::new()
        .top_k(&[1.0, 0.0, 0.0], &store, 1)
        .unwrap_err();

    assert_eq!(
        err,
        RankingError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn test_zero_k_is_rejected() {
    let store = store(&[("a", &[1.0])]);
    assert_eq!(
        ExactRanker::new().top_k(&[1.0], &store, 0),
        Err(RankingError::InvalidK)
    );
}

#[test]
fn test_nan_query_scores_do_not_panic() {
    let store = store(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0])]);
    let results = ExactRanker::new()
        .top_k(&[f32::NAN, 0.0], &store, 2)
        .unwrap();
    assert_eq!(ids(&results), vec!["a", "b"]);
}

#[test]
fn test_result_carries_record_fields() {
    let record = PhraseRecord::new("hi", "hello", vec![1.0, 0.0])
        .with_translation("안녕하세요")
        .with_tags(["greeting", "casual"]);
    let store = VectorStore::from_records(vec![record]).unwrap();

    let result = &ExactRanker::new().top_k(&[1.0, 0.0], &store, 5).unwrap()[0];

    assert_eq!(result.text, "hello");
    assert_eq!(result.translation.as_deref(), Some("안녕하세요"));
    assert_eq!(result.tags, vec!["greeting", "casual"]);
}

#[test]
fn test_scored_result_wire_shape() {
    let result = ScoredResult {
        id: "a".to_string(),
        text: "hello".to_string(),
        translation: None,
        tags: vec![],
        score: 0.5,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"id": "a", "text": "hello", "trans": null, "tags": [], "score": 0.5})
    );
}

#[test]
fn test_exact_ranker_reports_exact() {
    assert!(ExactRanker::new().is_exact());
}
