use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the corpus. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read corpus file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed corpus JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("corpus contains no records")]
    Empty,

    #[error("record {index} ('{id}') has an empty vector")]
    EmptyVector { index: usize, id: String },

    #[error("record {index} ('{id}') has a non-finite value at dimension {dim}")]
    NonFinite { index: usize, id: String, dim: usize },

    #[error("record {index} has duplicate id '{id}'")]
    DuplicateId { index: usize, id: String },

    #[error(
        "record {index} ('{id}') has dimension {actual}, expected {expected} (from the first record)"
    )]
    DimensionMismatch {
        index: usize,
        id: String,
        expected: usize,
        actual: usize,
    },
}
