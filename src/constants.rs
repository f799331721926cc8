//! Cross-cutting, shared constants.
//!
//! Protocol limits live here so the query validator, the gateway and the tests
//! agree on them.
//!
//! # Dimension Invariants
//!
//! The corpus fixes the embedding dimension at load time. Every vector that
//! enters the pipeline afterwards (query embeddings, stub embeddings) is checked
//! against it with [`validate_embedding_dim`] at the module boundary, so a
//! mismatch surfaces as an error instead of a silently truncated dot product.

use thiserror::Error;

/// Default number of results when a query omits `k`.
pub const DEFAULT_TOP_K: usize = 5;

/// Smallest accepted `k`.
pub const MIN_TOP_K: usize = 1;

/// Largest accepted `k`.
pub const MAX_TOP_K: usize = 20;

/// Maximum query length, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

/// Guards the cosine denominator against zero-norm vectors.
pub const COSINE_EPSILON: f64 = 1e-12;

/// Namespace prefix for semantic cache keys in the shared backend.
pub const CACHE_KEY_PREFIX: &str = "semcache:";

/// Default cache entry lifetime.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default rounding precision for quantized cache keys.
pub const DEFAULT_QUANTIZE_DECIMALS: usize = 2;

/// Default number of leading dimensions folded into a quantized cache key.
pub const DEFAULT_QUANTIZE_DIM_PREFIX: usize = 8;

/// Reserved: minimum top score below which a generative fallback would kick in.
pub const DEFAULT_MIN_SCORE: f32 = 0.5;

/// Message sent to every client right after the socket opens.
pub const WELCOME_MESSAGE: &str = "connected";

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    #[error("embedding dimension cannot be zero")]
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use phrasal::constants::validate_embedding_dim;
///
/// let corpus_dim = 1024;
/// validate_embedding_dim(1024, corpus_dim).unwrap();
/// assert!(validate_embedding_dim(768, corpus_dim).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 || actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
