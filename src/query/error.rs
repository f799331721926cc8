use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_QUERY_CHARS, MAX_TOP_K, MIN_TOP_K};
use crate::embedding::EmbeddingError;
use crate::ranking::RankingError;

/// Wire error codes sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidPayload,
    TextTooLong,
    InvalidK,
    EmbeddingFailed,
    InvalidMode,
    LlmFallbackModeNotImplemented,
    DimensionMismatch,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::InvalidPayload => "invalid_payload",
            ErrorCode::TextTooLong => "text_too_long",
            ErrorCode::InvalidK => "invalid_k",
            ErrorCode::EmbeddingFailed => "embedding_failed",
            ErrorCode::InvalidMode => "invalid_mode",
            ErrorCode::LlmFallbackModeNotImplemented => "llm_fallback_mode_not_implemented",
            ErrorCode::DimensionMismatch => "dimension_mismatch",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections raised before any backend is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("text has {chars} characters, maximum is {max}")]
    TextTooLong { chars: usize, max: usize },

    #[error("k must be an integer between {} and {}", MIN_TOP_K, MAX_TOP_K)]
    InvalidK,

    #[error("unknown mode '{value}'")]
    InvalidMode { value: String },
}

/// Why a query produced an error reply instead of results.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidRequest(#[from] ValidationError),

    #[error("llm_fallback mode is not implemented")]
    NotImplemented,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("query vector has {actual} dimensions, corpus has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("ranking failed: {0}")]
    Ranking(#[from] RankingError),
}

impl QueryError {
    /// The client-facing code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            QueryError::InvalidRequest(v) => match v {
                ValidationError::InvalidJson { .. } => ErrorCode::InvalidJson,
                ValidationError::InvalidPayload { .. } => ErrorCode::InvalidPayload,
                ValidationError::TextTooLong { .. } => ErrorCode::TextTooLong,
                ValidationError::InvalidK => ErrorCode::InvalidK,
                ValidationError::InvalidMode { .. } => ErrorCode::InvalidMode,
            },
            QueryError::NotImplemented => ErrorCode::LlmFallbackModeNotImplemented,
            QueryError::Embedding(_) => ErrorCode::EmbeddingFailed,
            QueryError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            QueryError::Ranking(RankingError::DimensionMismatch { .. }) => {
                ErrorCode::DimensionMismatch
            }
            QueryError::Ranking(RankingError::InvalidK) => ErrorCode::InvalidK,
        }
    }

    /// Optional human-readable detail sent alongside the code.
    pub fn details(&self) -> Option<String> {
        match self {
            QueryError::InvalidRequest(ValidationError::InvalidJson { .. })
            | QueryError::InvalidRequest(ValidationError::InvalidPayload { .. }) => None,
            QueryError::InvalidRequest(ValidationError::TextTooLong { .. }) => Some(format!(
                "Maximum text length is {MAX_QUERY_CHARS} characters"
            )),
            QueryError::InvalidRequest(ValidationError::InvalidK)
            | QueryError::Ranking(RankingError::InvalidK) => Some(format!(
                "k must be between {MIN_TOP_K} and {MAX_TOP_K}"
            )),
            QueryError::InvalidRequest(ValidationError::InvalidMode { .. }) => {
                Some("mode must be 'search' or 'llm_fallback'".to_string())
            }
            QueryError::NotImplemented => None,
            QueryError::Embedding(e) => Some(e.to_string()),
            QueryError::DimensionMismatch { .. } | QueryError::Ranking(_) => Some(self.to_string()),
        }
    }
}
