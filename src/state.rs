//! Per-document state threaded through the analysis stages.
//!
//! A [`DocumentState`] is created once per document with only its source text,
//! handed to each stage in turn, and consumed by the result projector. It is
//! never shared between documents, so nothing in here needs synchronisation.
//!
//! Each stage owns exactly one field. The setters are crate-private so only
//! stages write to the state; the summary is write-once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for a metadata field the model output did not provide.
pub const UNKNOWN: &str = "N/A";

/// Paper metadata parsed from the model's four-line template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl Default for PaperMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            authors: Vec::new(),
            publication_date: UNKNOWN.to_string(),
            abstract_text: UNKNOWN.to_string(),
        }
    }
}

impl PaperMetadata {
    /// `true` when every field still holds its default sentinel.
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// Sentiment label computed over the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entities found in the summary, by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub names: Vec<String>,
    pub dates: Vec<String>,
    pub amounts: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.dates.is_empty() && self.amounts.is_empty()
    }
}

/// The single record every stage reads from and writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentState {
    source_text: String,
    summary: Option<String>,
    metadata: PaperMetadata,
    sentiment: Option<Sentiment>,
    entities: Entities,
}

impl DocumentState {
    /// Fresh state with only the source text populated.
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            summary: None,
            metadata: PaperMetadata::default(),
            sentiment: None,
            entities: Entities::default(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn metadata(&self) -> &PaperMetadata {
        &self.metadata
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Store the summary. Returns `false` (and leaves the state untouched)
    /// if a summary was already recorded.
    pub(crate) fn set_summary(&mut self, summary: String) -> bool {
        if self.summary.is_some() {
            return false;
        }
        self.summary = Some(summary);
        true
    }

    pub(crate) fn set_metadata(&mut self, metadata: PaperMetadata) {
        self.metadata = metadata;
    }

    pub(crate) fn set_sentiment(&mut self, sentiment: Sentiment) {
        self.sentiment = Some(sentiment);
    }

    pub(crate) fn set_entities(&mut self, entities: Entities) {
        self.entities = entities;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_only_source_text() {
        let state = DocumentState::new("body");
        assert_eq!(state.source_text(), "body");
        assert_eq!(state.summary(), None);
        assert!(state.metadata().is_unknown());
        assert_eq!(state.sentiment(), None);
        assert!(state.entities().is_empty());
    }

    #[test]
    fn summary_is_write_once() {
        let mut state = DocumentState::new("body");
        assert!(state.set_summary("first".into()));
        assert!(!state.set_summary("second".into()));
        assert_eq!(state.summary(), Some("first"));
    }

    #[test]
    fn metadata_defaults_to_sentinels() {
        let meta = PaperMetadata::default();
        assert_eq!(meta.title, "N/A");
        assert!(meta.authors.is_empty());
        assert_eq!(meta.publication_date, "N/A");
        assert_eq!(meta.abstract_text, "N/A");
    }

    #[test]
    fn sentiment_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(Sentiment::Neutral.to_string(), "neutral");
    }
}
