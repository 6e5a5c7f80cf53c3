//! # paper-insight
//!
//! Find academic PDFs, extract their text, and run a fixed four-stage
//! language-model analysis over each one.
//!
//! ## Pipeline Overview
//!
//! ```text
//! query / PDF / URL / bytes
//!  │
//!  ├─ 1. Search    scrape Scholar for direct PDF links
//!  ├─ 2. Download  per-topic folder, stable file names
//!  ├─ 3. Extract   first N pages of text via pdfium (spawn_blocking)
//!  ├─ 4. Analyse   Summarize → ExtractMetadata → AnalyzeSentiment → ExtractEntities
//!  │               under one wall-clock timeout
//!  ├─ 5. Project   selected tasks → results mapping, or {"Error": ...}
//!  └─ 6. Store     optional JSON Lines sink
//! ```
//!
//! Sentiment and entities are computed from the *summary*, not the document.
//! Task selection only decides what is shown; all four stages always run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_insight::{analyze_pdf, AnalysisConfig, TaskSelection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = AnalysisConfig::builder()
//!         .tasks(TaskSelection::all())
//!         .build()?;
//!     let report = analyze_pdf("paper.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&report.outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a provider
//!
//! Inject any [`LanguageModel`] through
//! [`AnalysisConfigBuilder::language_model`]; it takes precedence over every
//! provider setting.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paper-insight` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod sink;
pub mod state;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::metadata::parse_metadata;
pub use analysis::project::project;
pub use analysis::rules::{classify_sentiment, extract_entities, validate_entities};
pub use analysis::runner::{PipelineRunner, Workflow};
pub use analysis::stages::Stage;
pub use analysis::topics::{classify_topic, extract_keywords, Topic};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, Task, TaskSelection};
pub use error::{InsightError, LlmError, PipelineError, ValidationError};
pub use llm::{CancellationToken, CompletionRequest, EdgequakeModel, LanguageModel};
pub use output::{
    AnalysisOutcome, AnalysisResults, DocumentRecord, DocumentReport, MetadataView,
};
pub use pipeline::download::DownloadReport;
pub use pipeline::extract::TextDocument;
pub use process::{
    analyze_batch, analyze_pdf, analyze_pdf_bytes, analyze_text, analyze_text_sync,
    search_and_analyze, search_and_download, store_reports,
};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sink::{JsonLinesSink, ResultSink};
pub use state::{DocumentState, Entities, PaperMetadata, Sentiment};
pub use stream::{analyze_stream, ReportStream};
