//! Top-level entry points: text, PDF, uploaded bytes, and search-driven batches.
//!
//! Every function here resolves the language model once, then feeds each
//! document through a [`PipelineRunner`]. A document whose analysis fails
//! still produces a [`DocumentReport`] (with the `{"Error": ..}` outcome);
//! only problems that stop the whole operation are returned as `Err`.

use crate::analysis::rules::validate_entities;
use crate::analysis::runner::PipelineRunner;
use crate::analysis::topics::{classify_topic, extract_keywords};
use crate::config::AnalysisConfig;
use crate::error::InsightError;
use crate::llm::resolve_language_model;
use crate::output::{content_hash, AnalysisOutcome, DocumentRecord, DocumentReport};
use crate::pipeline::download::{download_papers, DownloadReport};
use crate::pipeline::extract::{collect_topic_texts, extract_text, TextDocument};
use crate::pipeline::input;
use crate::sink::ResultSink;
use std::time::Instant;
use tracing::{info, warn};

/// Analyse already-extracted text.
///
/// # Errors
/// Only when no language model can be resolved. Analysis failures are
/// reported inside the returned [`DocumentReport`].
pub async fn analyze_text(
    document_id: impl Into<String>,
    text: &str,
    config: &AnalysisConfig,
) -> Result<DocumentReport, InsightError> {
    let runner = build_runner(config)?;
    Ok(analyze_with(&runner, document_id.into(), text).await)
}

/// Extract the first `config.max_pages` pages of a PDF file or URL and
/// analyse the text.
pub async fn analyze_pdf(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<DocumentReport, InsightError> {
    let input_str = input_str.as_ref();
    info!("Analysing PDF: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let runner = build_runner(config)?;
    let text = extract_text(resolved.path(), config.max_pages).await?;
    Ok(analyze_with(&runner, input_str.to_string(), &text).await)
}

/// Analyse an uploaded PDF held in memory.
///
/// The bytes go to a managed temp file that is removed before this returns.
pub async fn analyze_pdf_bytes(
    document_id: impl Into<String>,
    bytes: &[u8],
    config: &AnalysisConfig,
) -> Result<DocumentReport, InsightError> {
    let resolved = input::resolve_bytes(bytes)?;
    let runner = build_runner(config)?;
    let text = extract_text(resolved.path(), config.max_pages).await?;
    Ok(analyze_with(&runner, document_id.into(), &text).await)
}

/// Search for `query` and download up to `config.num_results` papers into
/// `config.data_dir`.
pub async fn search_and_download(
    query: &str,
    config: &AnalysisConfig,
) -> Result<DownloadReport, InsightError> {
    download_papers(query, &config.data_dir, config.num_results, config).await
}

/// Search, download, extract and analyse the papers for `query`.
///
/// # Errors
/// Fails when the search fails or the topic folder ends up with no readable
/// PDF. Per-document failures stay inside the reports.
pub async fn search_and_analyze(
    query: &str,
    config: &AnalysisConfig,
) -> Result<Vec<DocumentReport>, InsightError> {
    let downloads = search_and_download(query, config).await?;
    info!(
        "{} of {} link(s) downloaded for '{}'",
        downloads.downloaded(),
        downloads.links.len(),
        query
    );

    let documents =
        collect_topic_texts(&config.data_dir, query, config.max_pages, config.num_results).await?;
    analyze_batch(&documents, config).await
}

/// Analyse `documents` one after another, in order.
///
/// Each document gets its own state; one failure never stops the batch.
pub async fn analyze_batch(
    documents: &[TextDocument],
    config: &AnalysisConfig,
) -> Result<Vec<DocumentReport>, InsightError> {
    let runner = build_runner(config)?;
    let total = documents.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut reports = Vec::with_capacity(total);
    for (i, doc) in documents.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(i + 1, total, &doc.id);
        }
        let report = analyze_with(&runner, doc.id.clone(), &doc.text).await;
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_complete(i + 1, total, &doc.id, report.outcome.error());
        }
        reports.push(report);
    }

    let succeeded = reports.iter().filter(|r| !r.outcome.is_failed()).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }
    info!("Batch complete: {}/{} document(s) analysed", succeeded, total);
    Ok(reports)
}

/// Persist every completed report to `sink`, returning how many were stored.
///
/// Failed reports are skipped. Records whose entities fail validation are
/// logged and skipped; a sink error stops the loop.
pub async fn store_reports(
    reports: &[DocumentReport],
    sink: &dyn ResultSink,
) -> Result<usize, InsightError> {
    let mut stored = 0;
    for report in reports {
        let Some(record) = DocumentRecord::from_report(report) else {
            continue;
        };
        if let Err(e) = validate_entities(&record.entities) {
            warn!("Not storing {}: {}", report.document_id, e);
            continue;
        }
        sink.store(&record).await?;
        stored += 1;
    }
    Ok(stored)
}

/// Synchronous wrapper around [`analyze_text`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_text_sync(
    document_id: impl Into<String>,
    text: &str,
    config: &AnalysisConfig,
) -> Result<DocumentReport, InsightError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| InsightError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_text(document_id, text, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

pub(crate) fn build_runner(config: &AnalysisConfig) -> Result<PipelineRunner, InsightError> {
    let model = resolve_language_model(config)?;
    Ok(PipelineRunner::new(model, config.clone()))
}

/// Run one document and wrap everything about it in a report.
pub(crate) async fn analyze_with(
    runner: &PipelineRunner,
    document_id: String,
    text: &str,
) -> DocumentReport {
    let start = Instant::now();
    let outcome = AnalysisOutcome::from_run(runner.analyze(text).await);
    if let Some(e) = outcome.error() {
        warn!("Analysis of {} failed: {}", document_id, e);
    }

    let keyword_count = runner.config().keyword_count;
    let keywords = if keyword_count > 0 {
        extract_keywords(text, keyword_count)
    } else {
        Vec::new()
    };

    DocumentReport {
        content_hash: content_hash(text),
        outcome,
        keywords,
        topic: classify_topic(text),
        duration_ms: start.elapsed().as_millis() as u64,
        document_id,
    }
}
