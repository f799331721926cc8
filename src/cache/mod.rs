//! Quantized semantic cache in front of the ranker.
//!
//! - [`quantize`] maps a query vector to a lossy bucket key.
//! - [`entry`] defines the stored envelope and its migrations.
//! - [`SemanticCache`] wraps a [`CacheBackend`] with timeouts and soft-failure semantics.

pub mod backend;
pub mod entry;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod quantize;
pub mod redis_store;
pub mod semantic;

#[cfg(test)]
mod tests;

pub use backend::{CacheBackend, CacheStore};
pub use entry::{CacheEntry, ENVELOPE_VERSION, ResultSource, StoredFormat};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryBackend;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockCacheBackend;
pub use quantize::{QuantizedKey, Quantizer};
pub use redis_store::RedisBackend;
pub use semantic::{SemanticCache, SemanticCacheConfig};
