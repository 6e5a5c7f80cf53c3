//! Output types: the projected results mapping, the failure sentinel, per-document
//! reports and the storage record.

use crate::analysis::topics::Topic;
use crate::config::Task;
use crate::error::PipelineError;
use crate::state::{Entities, PaperMetadata, UNKNOWN};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Summary stored when the Summary task was not selected.
pub const NO_SUMMARY: &str = "No summary generated.";

/// Sentiment stored when the Sentiment Analysis task was not selected.
pub const UNKNOWN_SENTIMENT: &str = "Unknown";

/// Task result key → value, for the selected tasks only.
///
/// Fields are declared in task order, so serialised keys always come out as
/// Summary, Metadata, Sentiment, Entities whatever the selection order was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResults {
    #[serde(rename = "Summary", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataView>,

    #[serde(rename = "Sentiment", default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,

    #[serde(rename = "Entities", default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Entities>,
}

impl AnalysisResults {
    /// Result keys present, in display order.
    pub fn keys(&self) -> Vec<&'static str> {
        let present = [
            (Task::Summary, self.summary.is_some()),
            (Task::MetadataExtraction, self.metadata.is_some()),
            (Task::SentimentAnalysis, self.sentiment.is_some()),
            (Task::EntityRecognition, self.entities.is_some()),
        ];
        present
            .into_iter()
            .filter(|(_, p)| *p)
            .map(|(t, _)| t.result_key())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// Metadata as shown to users: four fixed sub-keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataView {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Authors")]
    pub authors: Vec<String>,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
}

impl From<&PaperMetadata> for MetadataView {
    fn from(m: &PaperMetadata) -> Self {
        Self {
            title: m.title.clone(),
            authors: m.authors.clone(),
            publication_date: m.publication_date.clone(),
            abstract_text: m.abstract_text.clone(),
        }
    }
}

/// `{"Error": "<message>"}`, returned in place of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureSentinel {
    #[serde(rename = "Error")]
    pub error: String,
}

/// Either the results mapping or the failure sentinel.
///
/// Serialises untagged, so callers reading JSON check for an `"Error"` key
/// before treating the object as results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    // Tried first on deserialisation; only a lone "Error" key matches.
    Failed(FailureSentinel),
    Completed(AnalysisResults),
}

impl AnalysisOutcome {
    /// Fold a runner result into an outcome. Every error kind becomes the
    /// same sentinel shape.
    pub fn from_run(result: Result<AnalysisResults, PipelineError>) -> Self {
        match result {
            Ok(results) => AnalysisOutcome::Completed(results),
            Err(e) => AnalysisOutcome::failed(e.to_string()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        AnalysisOutcome::Failed(FailureSentinel {
            error: message.into(),
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed(_))
    }

    pub fn results(&self) -> Option<&AnalysisResults> {
        match self {
            AnalysisOutcome::Completed(r) => Some(r),
            AnalysisOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Failed(f) => Some(&f.error),
            AnalysisOutcome::Completed(_) => None,
        }
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// File name, URL or caller-supplied id.
    pub document_id: String,
    /// Hex SHA-256 of the source text.
    pub content_hash: String,
    pub outcome: AnalysisOutcome,
    /// Empty unless keyword extraction was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub topic: Topic,
    pub duration_ms: u64,
}

/// Hex SHA-256 of `text`, used as the stable document id in storage.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// The row persisted by a [`crate::sink::ResultSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub summary: String,
    pub sentiment: String,
    pub entities: Entities,
    pub created_at: String,
}

impl DocumentRecord {
    /// Build a record from projected results. Tasks that were not selected
    /// fall back to their storage defaults.
    pub fn from_results(source_text: &str, results: &AnalysisResults) -> Self {
        Self::with_id(content_hash(source_text), results)
    }

    /// Record for a completed report; `None` for a failed one.
    pub fn from_report(report: &DocumentReport) -> Option<Self> {
        report
            .outcome
            .results()
            .map(|results| Self::with_id(report.content_hash.clone(), results))
    }

    fn with_id(document_id: String, results: &AnalysisResults) -> Self {
        let metadata = results.metadata.clone().unwrap_or_else(|| MetadataView {
            title: UNKNOWN.to_string(),
            authors: Vec::new(),
            publication_date: UNKNOWN.to_string(),
            abstract_text: UNKNOWN.to_string(),
        });

        Self {
            document_id,
            title: metadata.title,
            authors: metadata.authors,
            publication_date: metadata.publication_date,
            abstract_text: metadata.abstract_text,
            summary: results
                .summary
                .clone()
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
            sentiment: results
                .sentiment
                .clone()
                .unwrap_or_else(|| UNKNOWN_SENTIMENT.to_string()),
            entities: results.entities.clone().unwrap_or_default(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_results() -> AnalysisResults {
        AnalysisResults {
            summary: Some("Good work.".into()),
            metadata: Some(MetadataView {
                title: "Foo".into(),
                authors: vec!["A".into(), "B".into()],
                publication_date: "2020".into(),
                abstract_text: "bar baz".into(),
            }),
            sentiment: Some("positive".into()),
            entities: Some(Entities::default()),
        }
    }

    #[test]
    fn keys_follow_task_order() {
        let results = AnalysisResults {
            entities: Some(Entities::default()),
            summary: Some("s".into()),
            ..Default::default()
        };
        assert_eq!(results.keys(), vec!["Summary", "Entities"]);
        assert!(AnalysisResults::default().is_empty());
    }

    #[test]
    fn results_serialise_in_task_order_with_metadata_subkeys() {
        let json = serde_json::to_string(&full_results()).unwrap();
        let s = json.find("\"Summary\"").unwrap();
        let m = json.find("\"Metadata\"").unwrap();
        let se = json.find("\"Sentiment\"").unwrap();
        let e = json.find("\"Entities\"").unwrap();
        assert!(s < m && m < se && se < e, "got: {json}");
        assert!(json.contains("\"Publication Date\":\"2020\""));
        assert!(json.contains("\"Abstract\":\"bar baz\""));
    }

    #[test]
    fn failure_serialises_as_error_sentinel() {
        let outcome = AnalysisOutcome::from_run(Err(PipelineError::Timeout { budget_ms: 30_000 }));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"Error": "Workflow timed out after 30.0s. Please try again."})
        );
    }

    #[test]
    fn outcomes_deserialise_to_the_right_variant() {
        let failed: AnalysisOutcome = serde_json::from_str(r#"{"Error":"boom"}"#).unwrap();
        assert_eq!(failed.error(), Some("boom"));

        let ok: AnalysisOutcome = serde_json::from_str(r#"{"Summary":"x"}"#).unwrap();
        assert_eq!(ok.results().unwrap().summary.as_deref(), Some("x"));
    }

    #[test]
    fn record_uses_defaults_for_unselected_tasks() {
        let results = AnalysisResults {
            summary: Some("only a summary".into()),
            ..Default::default()
        };
        let record = DocumentRecord::from_results("body", &results);
        assert_eq!(record.document_id, content_hash("body"));
        assert_eq!(record.document_id.len(), 64);
        assert_eq!(record.title, "N/A");
        assert!(record.authors.is_empty());
        assert_eq!(record.summary, "only a summary");
        assert_eq!(record.sentiment, "Unknown");
        assert!(record.entities.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
    }

    #[test]
    fn failed_report_has_no_record() {
        let report = DocumentReport {
            document_id: "a.pdf".into(),
            content_hash: content_hash("a"),
            outcome: AnalysisOutcome::failed("boom"),
            keywords: Vec::new(),
            topic: Topic::General,
            duration_ms: 1,
        };
        assert!(DocumentRecord::from_report(&report).is_none());
    }

    #[test]
    fn record_copies_selected_results() {
        let record = DocumentRecord::from_results("body", &full_results());
        assert_eq!(record.title, "Foo");
        assert_eq!(record.authors, vec!["A", "B"]);
        assert_eq!(record.abstract_text, "bar baz");
        assert_eq!(record.sentiment, "positive");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["abstract"], "bar baz");
    }
}
