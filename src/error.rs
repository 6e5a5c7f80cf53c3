//! Error types for the paper-insight library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`InsightError`] — **Fatal**: the requested operation cannot proceed at
//!   all (bad input file, search endpoint unreachable, provider not
//!   configured). Returned as `Err(InsightError)` from the top-level entry
//!   points in [`crate::process`].
//!
//! * [`PipelineError`] — **Per-document**: the analysis workflow for one
//!   document failed (build failure, timeout, stage error). Stored inside
//!   [`crate::output::DocumentReport`] as a failure outcome so a batch of
//!   downloaded papers keeps going when one of them fails.
//!
//! [`LlmError`] is what a [`crate::llm::LanguageModel`] returns; stages wrap it
//! into [`PipelineError::Stage`].

use crate::analysis::stages::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paper-insight library.
#[derive(Debug, Error)]
pub enum InsightError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// The topic folder is missing, empty, or holds no readable PDFs.
    #[error("No PDF files found in folder: '{folder}'")]
    NoDocuments { folder: PathBuf },

    // ── Search errors ─────────────────────────────────────────────────────
    /// The search results page could not be fetched.
    #[error("Paper search for '{query}' failed: {reason}")]
    SearchFailed { query: String, reason: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Persistence errors ────────────────────────────────────────────────
    /// Could not append a record to the results sink.
    #[error("Failed to write results to '{path}': {source}")]
    SinkWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record was rejected before it reached the sink.
    #[error("Refusing to store record: {0}")]
    Validation(#[from] ValidationError),

    /// A record could not be serialised.
    #[error("Failed to serialise record: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure of the analysis workflow for a single document.
///
/// None of these carry partial state: whatever the completed stages wrote is
/// discarded together with the failed run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PipelineError {
    /// The workflow could not be assembled (invalid stage list, invalid
    /// generation budget, or the worker died before finishing).
    #[error("Workflow could not be built: {0}")]
    Build(String),

    /// The bounded wait elapsed before the last stage finished.
    #[error(
        "Workflow timed out after {:.1}s. Please try again.",
        *.budget_ms as f64 / 1000.0
    )]
    Timeout { budget_ms: u64 },

    /// A stage's model call failed; the run was aborted at that stage.
    #[error("Stage '{stage}' failed: {detail}")]
    Stage { stage: Stage, detail: String },
}

/// Errors returned by a [`crate::llm::LanguageModel`].
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The provider rejected or failed the request.
    #[error("LLM API error: {0}")]
    Api(String),

    /// The caller gave up on the request before it completed.
    #[error("request cancelled")]
    Cancelled,
}

/// Entity values that do not match their slot's expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", .violations.join("; "))]
pub struct ValidationError {
    /// One message per offending slot, e.g. `"Invalid dates: tomorrow"`.
    pub violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_mentions_budget() {
        let e = PipelineError::Timeout { budget_ms: 30_000 };
        let msg = e.to_string();
        assert!(msg.contains("timed out"), "got: {msg}");
        assert!(msg.contains("30.0s"), "got: {msg}");

        let short = PipelineError::Timeout { budget_ms: 100 }.to_string();
        assert!(short.contains("0.1s"), "got: {short}");
    }

    #[test]
    fn build_and_timeout_are_distinct() {
        let build = PipelineError::Build("bad stage list".into()).to_string();
        let timeout = PipelineError::Timeout { budget_ms: 1_000 }.to_string();
        assert_ne!(build, timeout);
        assert!(build.contains("bad stage list"));
    }

    #[test]
    fn stage_error_names_the_stage() {
        let e = PipelineError::Stage {
            stage: Stage::Summarize,
            detail: "quota exceeded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("summarization"), "got: {msg}");
        assert!(msg.contains("quota exceeded"));
    }

    #[test]
    fn validation_error_joins_violations() {
        let e = ValidationError {
            violations: vec!["Invalid dates: soon".into(), "Invalid amounts: 5".into()],
        };
        assert_eq!(
            e.to_string(),
            "Validation failed: Invalid dates: soon; Invalid amounts: 5"
        );
    }

    #[test]
    fn search_failed_display() {
        let e = InsightError::SearchFailed {
            query: "graph neural networks".into(),
            reason: "HTTP 429".into(),
        };
        assert!(e.to_string().contains("graph neural networks"));
        assert!(e.to_string().contains("429"));
    }
}
