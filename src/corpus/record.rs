use serde::{Deserialize, Serialize};

/// One labeled phrase from the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseRecord {
    /// Unique identifier.
    pub id: String,
    /// Source phrase.
    pub text: String,
    /// Optional translation (`trans` on disk and on the wire).
    #[serde(rename = "trans")]
    pub translation: Option<String>,
    /// Free-form labels, in file order.
    pub tags: Vec<String>,
    /// Embedding of `text`; every record in a store has the same length.
    pub vector: Vec<f32>,
}

impl PhraseRecord {
    /// Builds a record with no translation and no tags.
    pub fn new(id: impl Into<String>, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            translation: None,
            tags: Vec::new(),
            vector,
        }
    }

    /// Sets the translation.
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Sets the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the vector dimension.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Record shape as produced by the offline embedding job.
///
/// Every field is optional here so that a missing one can be reported with the
/// record index instead of a bare serde message.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(default, alias = "translation")]
    pub trans: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub vector: Option<Vec<f32>>,
}
