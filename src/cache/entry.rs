//! Cached result sets and their stored envelope.
//!
//! Entries are written as `{"v":1,"source":"search","data":[...]}`. Two older
//! shapes are migrated explicitly on read:
//!
//! - a bare JSON array of results, read as `source: search`;
//! - an unversioned `{"source": ..., "data": [...]}` object.
//!
//! Anything else, including an unknown `v`, is rejected.

use serde::{Deserialize, Serialize};

use super::error::{CacheError, CacheResult};
use crate::ranking::ScoredResult;

/// Current envelope version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Where a result set came from. Preserved across cache hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Search,
    Llm,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSource::Search => "search",
            ResultSource::Llm => "llm",
        }
    }
}

impl std::fmt::Display for ResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stored shape an entry was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    Versioned,
    Unversioned,
    Legacy,
}

/// A ranked result set plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub source: ResultSource,
    pub data: Vec<ScoredResult>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    source: ResultSource,
    data: &'a [ScoredResult],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Versioned {
        v: u32,
        source: ResultSource,
        data: Vec<ScoredResult>,
    },
    Unversioned {
        source: ResultSource,
        data: Vec<ScoredResult>,
    },
    Legacy(Vec<ScoredResult>),
}

impl CacheEntry {
    /// A fresh result set from the ranker.
    pub fn search(data: Vec<ScoredResult>) -> Self {
        Self {
            source: ResultSource::Search,
            data,
        }
    }

    /// Serializes into the current envelope version.
    pub fn encode(&self) -> CacheResult<String> {
        let envelope = EnvelopeRef {
            v: ENVELOPE_VERSION,
            source: self.source,
            data: &self.data,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Reads any supported stored shape.
    pub fn decode(raw: &str) -> CacheResult<(Self, StoredFormat)> {
        let stored: StoredEntry =
            serde_json::from_str(raw).map_err(|e| CacheError::Envelope {
                reason: e.to_string(),
            })?;

        match stored {
            StoredEntry::Versioned { v, source, data } if v == ENVELOPE_VERSION => {
                Ok((Self { source, data }, StoredFormat::Versioned))
            }
            StoredEntry::Versioned { v, .. } => Err(CacheError::Envelope {
                reason: format!("unsupported envelope version {v}"),
            }),
            StoredEntry::Unversioned { source, data } => {
                Ok((Self { source, data }, StoredFormat::Unversioned))
            }
            StoredEntry::Legacy(data) => Ok((Self::search(data), StoredFormat::Legacy)),
        }
    }
}
