//! Streaming batch API: emit each document's report as soon as it is ready.
//!
//! [`crate::process::analyze_batch`] returns only after every document has
//! been analysed. [`analyze_stream`] yields the same reports one at a time, in
//! input order, so callers can print or persist them progressively.

use crate::config::AnalysisConfig;
use crate::error::InsightError;
use crate::output::DocumentReport;
use crate::pipeline::extract::TextDocument;
use crate::process::{analyze_with, build_runner};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document reports.
pub type ReportStream = Pin<Box<dyn Stream<Item = DocumentReport> + Send>>;

/// Analyse `documents` sequentially, yielding each report as it completes.
///
/// # Errors
/// Only when no language model can be resolved.
///
/// # Example
/// ```rust,no_run
/// use paper_insight::{analyze_stream, AnalysisConfig, TextDocument};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let docs = vec![TextDocument { id: "a".into(), text: "Some paper text".into() }];
/// let mut reports = analyze_stream(docs, &AnalysisConfig::default())?;
/// while let Some(report) = reports.next().await {
///     println!("{}: failed = {}", report.document_id, report.outcome.is_failed());
/// }
/// # Ok(())
/// # }
/// ```
pub fn analyze_stream(
    documents: Vec<TextDocument>,
    config: &AnalysisConfig,
) -> Result<ReportStream, InsightError> {
    let runner = build_runner(config)?;
    let total = documents.len();
    info!("Starting streaming analysis of {} document(s)", total);

    let s = stream::iter(documents.into_iter().enumerate()).then(move |(i, doc)| {
        let runner = runner.clone();
        async move {
            let cb = runner.config().progress_callback.clone();
            if let Some(ref cb) = cb {
                cb.on_document_start(i + 1, total, &doc.id);
            }
            let report = analyze_with(&runner, doc.id.clone(), &doc.text).await;
            if let Some(ref cb) = cb {
                cb.on_document_complete(i + 1, total, &doc.id, report.outcome.error());
            }
            report
        }
    });

    Ok(Box::pin(s))
}
