#![allow(dead_code)]

pub mod harness;

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

/// Writes a small two-dimensional corpus to a temp file.
pub fn corpus_file() -> NamedTempFile {
    let corpus = json!([
        {"id": "greet-1", "text": "good morning", "trans": "좋은 아침", "tags": ["greeting"], "vector": [1.0, 0.0]},
        {"id": "greet-2", "text": "good evening", "trans": "좋은 저녁", "tags": ["greeting"], "vector": [0.9, 0.1]},
        {"id": "thanks-1", "text": "thank you", "tags": ["polite"], "vector": [0.0, 1.0]},
        {"id": "thanks-2", "text": "thanks a lot", "vector": [0.1, 0.9]}
    ]);
    let mut file = NamedTempFile::new().expect("create temp corpus");
    file.write_all(corpus.to_string().as_bytes())
        .expect("write temp corpus");
    file
}
