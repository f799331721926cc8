use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {reason}")]
    Transport { reason: String },

    #[error("embedding timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("embedding provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("malformed embedding response: {reason}")]
    Malformed { reason: String },

    #[error("embedding provider returned an empty vector")]
    Empty,

    #[error("embedding model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbeddingError::Malformed {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::Transport {
                reason: err.to_string(),
            }
        }
    }
}
