//! Exact cosine top-k over the in-memory corpus.
//!
//! [`Ranker`] is the seam for alternative index structures. Any implementation
//! that does not reproduce the exact top-k-by-cosine ordering must report
//! `is_exact() == false`.

mod error;
pub mod similarity;

#[cfg(test)]
mod tests;

pub use error::{RankingError, RankingResult};
pub use similarity::{cosine_similarity, dot, norm};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{PhraseRecord, VectorStore};

/// A corpus record paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: String,
    pub text: String,
    #[serde(rename = "trans", default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub score: f32,
}

impl ScoredResult {
    /// Copies the display fields of `record` and attaches `score`.
    pub fn from_record(record: &PhraseRecord, score: f32) -> Self {
        Self {
            id: record.id.clone(),
            text: record.text.clone(),
            translation: record.translation.clone(),
            tags: record.tags.clone(),
            score,
        }
    }
}

/// Selects the `k` corpus records most similar to a query vector.
pub trait Ranker: Send + Sync {
    /// Returns at most `k` results ordered by non-increasing score; ties keep corpus order.
    fn top_k(
        &self,
        query: &[f32],
        store: &VectorStore,
        k: usize,
    ) -> RankingResult<Vec<ScoredResult>>;

    /// `true` if results are the exact cosine top-k.
    fn is_exact(&self) -> bool;
}

/// Brute-force linear scan: O(N·D) per query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactRanker;

impl ExactRanker {
    pub fn new() -> Self {
        Self
    }
}

impl Ranker for ExactRanker {
    fn top_k(
        &self,
        query: &[f32],
        store: &VectorStore,
        k: usize,
    ) -> RankingResult<Vec<ScoredResult>> {
        if k == 0 {
            return Err(RankingError::InvalidK);
        }
        if query.len() != store.dimension() {
            return Err(RankingError::DimensionMismatch {
                expected: store.dimension(),
                actual: query.len(),
            });
        }

        let query_norm = similarity::norm(query);
        let mut scored: Vec<(usize, f32)> = store
            .all()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                (
                    index,
                    similarity::cosine_with_query_norm(query, query_norm, &record.vector),
                )
            })
            .collect();

        // `sort_by` is stable, so equal scores keep corpus order.
        scored.sort_by(|a, b| descending(a.1, b.1));
        scored.truncate(k);

        debug!(
            corpus = store.len(),
            k,
            returned = scored.len(),
            best_score = scored.first().map(|(_, s)| *s),
            "Ranked corpus"
        );

        let records = store.all();
        Ok(scored
            .into_iter()
            .map(|(index, score)| ScoredResult::from_record(&records[index], score))
            .collect())
    }

    fn is_exact(&self) -> bool {
        true
    }
}

/// Orders by score descending with NaN last.
#[inline]
fn descending(a: f32, b: f32) -> Ordering {
    let key = |s: f32| if s.is_nan() { f32::NEG_INFINITY } else { s };
    key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal)
}
