//! Vector similarity primitives.
//!
//! Accumulation happens in `f64` so that the epsilon guard stays meaningful and
//! long vectors do not lose precision; results are narrowed to `f32` at the end.

use crate::constants::COSINE_EPSILON;

/// Dot product. Callers must pass equal-length slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Euclidean norm.
#[inline]
pub fn norm(a: &[f32]) -> f64 {
    a.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

/// `dot(a, b) / (|a| * |b| + eps)`.
///
/// A zero-norm operand yields `0.0` rather than NaN. Callers must pass
/// equal-length slices; [`super::ExactRanker`] checks this before scoring.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_query_norm(a, norm(a), b)
}

/// Cosine with a precomputed norm for `query`, used when scoring one query
/// against many records.
#[inline]
pub(crate) fn cosine_with_query_norm(query: &[f32], query_norm: f64, b: &[f32]) -> f32 {
    let (dot, norm_b_sq) = query
        .iter()
        .zip(b.iter())
        .fold((0.0f64, 0.0f64), |(dot, nb), (&qv, &bv)| {
            let qv = f64::from(qv);
            let bv = f64::from(bv);
            (dot + qv * bv, nb + bv * bv)
        });

    (dot / (query_norm * norm_b_sq.sqrt() + COSINE_EPSILON)) as f32
}
