use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankingError {
    #[error("query dimension {actual} does not match corpus dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("k must be at least 1")]
    InvalidK,
}

pub type RankingResult<T> = Result<T, RankingError>;
