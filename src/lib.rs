//! Phrasal library crate (used by the server binary and integration tests).
//!
//! Real-time semantic phrase lookup: a client sends free text over a
//! WebSocket, the text is embedded, and the closest phrases from an
//! in-memory corpus are returned. Results are cached under a quantized
//! form of the query vector so near-duplicate queries skip ranking.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`VectorStore`], [`PhraseRecord`] - Immutable phrase corpus
//! - [`QueryProcessor`], [`QueryRequest`] - Per-request pipeline
//!
//! ## Embedding
//! - [`EmbeddingClient`] - Text → vector seam
//! - [`EmbeddingBackend`] - HTTP service, local candle model or stub
//!
//! ## Cache
//! - [`SemanticCache`], [`Quantizer`], [`CacheEntry`] - Quantized result cache
//! - [`CacheStore`] - Redis or in-process backend
//!
//! ## Ranking
//! - [`Ranker`], [`ExactRanker`], [`cosine_similarity`] - Top-k search
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod embedding;
pub mod gateway;
pub mod query;
pub mod ranking;

pub use cache::{
    CacheBackend, CacheEntry, CacheError, CacheStore, QuantizedKey, Quantizer, ResultSource,
    SemanticCache, SemanticCacheConfig,
};
#[cfg(any(test, feature = "mock"))]
pub use cache::MockCacheBackend;
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use corpus::{LoadError, PhraseRecord, VectorStore};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    EmbeddingBackend, EmbeddingBackendKind, EmbeddingClient, EmbeddingConfig, EmbeddingError,
    EmbeddingReadiness,
};
pub use gateway::{AppState, ServerMessage, create_router_with_state};
pub use query::{
    ErrorCode, QueryConfig, QueryError, QueryMode, QueryOutcome, QueryProcessor, QueryRequest,
    QueryResponse, QueryState,
};
pub use ranking::{ExactRanker, Ranker, RankingError, ScoredResult, cosine_similarity};
