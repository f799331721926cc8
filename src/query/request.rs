use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::error::ValidationError;
use crate::constants::{DEFAULT_TOP_K, MAX_QUERY_CHARS, MAX_TOP_K, MIN_TOP_K};

/// How a query should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Nearest phrases from the corpus.
    #[default]
    Search,
    /// Reserved: generate an answer when search scores are too low.
    LlmFallback,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Search => "search",
            QueryMode::LlmFallback => "llm_fallback",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(QueryMode::Search),
            "llm_fallback" => Ok(QueryMode::LlmFallback),
            other => Err(ValidationError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

/// A validated `{"type":"query"}` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    text: String,
    k: usize,
    mode: QueryMode,
}

impl QueryRequest {
    /// Builds a request, applying the same bounds as wire parsing.
    pub fn new(text: impl Into<String>, k: usize, mode: QueryMode) -> Result<Self, ValidationError> {
        let text = text.into();
        check_text(&text)?;
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&k) {
            return Err(ValidationError::InvalidK);
        }
        Ok(Self { text, k, mode })
    }

    /// A search request for `text` with the default `k`.
    pub fn search(text: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(text, DEFAULT_TOP_K, QueryMode::Search)
    }

    /// Parses and validates one raw client message.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| ValidationError::InvalidJson {
            reason: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Validates an already-decoded message.
    ///
    /// Checks run in order: payload shape, text length, `k`, `mode`.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid_payload("message must be a JSON object"))?;

        if obj.get("type").and_then(Value::as_str) != Some("query") {
            return Err(invalid_payload("type must be \"query\""));
        }

        let text = match obj.get("text") {
            Some(Value::String(text)) if !text.is_empty() => text,
            _ => return Err(invalid_payload("text must be a non-empty string")),
        };
        check_text(text)?;

        let k = match obj.get("k") {
            None | Some(Value::Null) => DEFAULT_TOP_K,
            Some(value) => value
                .as_u64()
                .and_then(|k| usize::try_from(k).ok())
                .filter(|k| (MIN_TOP_K..=MAX_TOP_K).contains(k))
                .ok_or(ValidationError::InvalidK)?,
        };

        let mode = match obj.get("mode") {
            None | Some(Value::Null) => QueryMode::default(),
            Some(Value::String(mode)) => mode.parse()?,
            Some(other) => {
                return Err(ValidationError::InvalidMode {
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            text: text.clone(),
            k,
            mode,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }
}

fn check_text(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(invalid_payload("text must be a non-empty string"));
    }
    let chars = text.chars().count();
    if chars > MAX_QUERY_CHARS {
        return Err(ValidationError::TextTooLong {
            chars,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(())
}

fn invalid_payload(reason: &str) -> ValidationError {
    ValidationError::InvalidPayload {
        reason: reason.to_string(),
    }
}
