//! Per-request query pipeline.
//!
//! A client message is validated into a [`QueryRequest`], embedded, looked up
//! in the [`SemanticCache`](crate::cache::SemanticCache), and on a miss ranked
//! against the corpus and written back. [`QueryProcessor`] drives the steps
//! and records them as [`QueryState`] transitions.

mod error;
mod processor;
mod request;
mod state;


pub use error::{ErrorCode, QueryError, ValidationError};
pub use processor::{QueryConfig, QueryOutcome, QueryProcessor, QueryResponse};
pub use request::{QueryMode, QueryRequest};
pub use state::{QueryState, StateTrace};
