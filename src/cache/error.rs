use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by cache backends and the envelope codec.
///
/// None of these reach a client: [`super::SemanticCache`] turns every one of
/// them into a soft miss or a dropped write.
pub enum CacheError {
    /// Transport or server error from the backend.
    #[error("cache backend error: {reason}")]
    Backend {
        /// Error message.
        reason: String,
    },

    /// The backend did not answer in time.
    #[error("cache {operation} timed out after {after:?}")]
    Timeout {
        /// `get`, `set` or `ping`.
        operation: &'static str,
        /// Configured timeout.
        after: Duration,
    },

    /// Stored payload could not be read as a cache entry.
    #[error("unreadable cache entry: {reason}")]
    Envelope {
        /// Error message.
        reason: String,
    },

    /// Entry could not be serialized for storage.
    #[error("cache entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configured URL names no known backend.
    #[error("unsupported cache url '{url}': expected redis://, rediss:// or memory://")]
    UnsupportedUrl {
        /// Offending URL.
        url: String,
    },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend {
            reason: err.to_string(),
        }
    }
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
