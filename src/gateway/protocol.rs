//! Server → client message shapes.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::cache::ResultSource;
use crate::constants::WELCOME_MESSAGE;
use crate::query::{ErrorCode, QueryError, QueryResponse};
use crate::ranking::ScoredResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        msg: String,
    },
    Result {
        source: ResultSource,
        data: Vec<ScoredResult>,
    },
    Error {
        error: ErrorCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl ServerMessage {
    pub fn welcome() -> Self {
        ServerMessage::Welcome {
            msg: WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        ServerMessage::Error {
            error: code,
            details: None,
        }
    }

    /// Serializes to a JSON text frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize server message");
            r#"{"type":"error","error":"invalid_payload"}"#.to_string()
        })
    }
}

impl From<QueryResponse> for ServerMessage {
    fn from(response: QueryResponse) -> Self {
        ServerMessage::Result {
            source: response.source,
            data: response.data,
        }
    }
}

impl From<&QueryError> for ServerMessage {
    fn from(err: &QueryError) -> Self {
        ServerMessage::Error {
            error: err.code(),
            details: err.details(),
        }
    }
}

impl From<Result<QueryResponse, QueryError>> for ServerMessage {
    fn from(result: Result<QueryResponse, QueryError>) -> Self {
        match result {
            Ok(response) => response.into(),
            Err(e) => ServerMessage::from(&e),
        }
    }
}
