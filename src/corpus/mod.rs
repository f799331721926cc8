//! Immutable in-memory phrase corpus.
//!
//! The corpus is a JSON array produced offline:
//!
//! ```json
//! [{"id": "p1", "text": "good morning", "trans": "좋은 아침", "tags": ["greeting"], "vector": [0.1, 0.2]}]
//! ```
//!
//! It is loaded and validated once; afterwards [`VectorStore`] only hands out
//! shared read-only views, so tasks read it without any locking.

mod error;
mod record;


pub use error::LoadError;
pub use record::PhraseRecord;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use record::RawRecord;

/// Validated, immutable set of [`PhraseRecord`]s sharing one dimension.
#[derive(Clone)]
pub struct VectorStore {
    records: Arc<[PhraseRecord]>,
    by_id: Arc<HashMap<String, usize>>,
    dimension: usize,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("records", &self.records.len())
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl VectorStore {
    /// Reads and validates a corpus file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            records = store.len(),
            dimension = store.dimension(),
            "Corpus loaded"
        );
        Ok(store)
    }

    /// Parses and validates a corpus from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let raw_records: Vec<RawRecord> = serde_json::from_str(raw)?;

        let records = raw_records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Self::convert(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_records(records)
    }

    /// Validates already-built records.
    pub fn from_records(records: Vec<PhraseRecord>) -> Result<Self, LoadError> {
        let first = records.first().ok_or(LoadError::Empty)?;
        let dimension = first.dimension();

        let mut by_id = HashMap::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if record.vector.is_empty() {
                return Err(LoadError::EmptyVector {
                    index,
                    id: record.id.clone(),
                });
            }
            if record.dimension() != dimension {
                return Err(LoadError::DimensionMismatch {
                    index,
                    id: record.id.clone(),
                    expected: dimension,
                    actual: record.dimension(),
                });
            }
            if let Some(dim) = record.vector.iter().position(|v| !v.is_finite()) {
                return Err(LoadError::NonFinite {
                    index,
                    id: record.id.clone(),
                    dim,
                });
            }
            if by_id.insert(record.id.clone(), index).is_some() {
                return Err(LoadError::DuplicateId {
                    index,
                    id: record.id.clone(),
                });
            }
        }

        debug!(records = records.len(), dimension, "Corpus validated");

        Ok(Self {
            records: records.into(),
            by_id: Arc::new(by_id),
            dimension,
        })
    }

    fn convert(index: usize, raw: RawRecord) -> Result<PhraseRecord, LoadError> {
        let id = raw.id.ok_or(LoadError::MissingField { index, field: "id" })?;
        let text = raw.text.ok_or(LoadError::MissingField {
            index,
            field: "text",
        })?;
        let vector = raw.vector.ok_or(LoadError::MissingField {
            index,
            field: "vector",
        })?;

        Ok(PhraseRecord {
            id,
            text,
            translation: raw.trans,
            tags: raw.tags.unwrap_or_default(),
            vector,
        })
    }

    /// All records, in file order.
    #[inline]
    pub fn all(&self) -> &[PhraseRecord] {
        &self.records
    }

    /// Looks up a record by id.
    pub fn get(&self, id: &str) -> Option<&PhraseRecord> {
        self.by_id.get(id).map(|&index| &self.records[index])
    }

    /// Shared vector dimension.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false` for a successfully loaded store.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
