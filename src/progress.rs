//! Progress-callback trait for batch, document and stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as papers are downloaded and each document moves through the four
//! analysis stages.
//!
//! # Example
//!
//! ```rust
//! use paper_insight::{AnalysisConfig, AnalysisProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StageCounter {
//!     finished: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for StageCounter {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} finished in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(StageCounter { finished: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::analysis::stages::Stage;
use std::sync::Arc;

/// Called by the library as it downloads and analyses documents.
///
/// Stage events fire from inside the workflow worker task, so
/// implementations must be `Send + Sync`. All methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called after a search, once per link, when its download finished or
    /// was skipped.
    ///
    /// # Arguments
    /// * `index` — 1-indexed link number
    /// * `total` — links returned by the search
    /// * `url`   — the PDF link
    /// * `saved` — `true` if the file is now on disk (fresh or already cached)
    fn on_download(&self, index: usize, total: usize, url: &str, saved: bool) {
        let _ = (index, total, url, saved);
    }

    /// Called once before the first document of a batch is analysed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document's workflow is started.
    ///
    /// # Arguments
    /// * `index`       — 1-indexed position in the batch
    /// * `total`       — documents in the batch
    /// * `document_id` — file name or caller-supplied id
    fn on_document_start(&self, index: usize, total: usize, document_id: &str) {
        let _ = (index, total, document_id);
    }

    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage has written its field(s).
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a document's outcome is known.
    ///
    /// `error` is `None` on success, or the failure message otherwise.
    fn on_document_complete(
        &self,
        index: usize,
        total: usize,
        document_id: &str,
        error: Option<&str>,
    ) {
        let _ = (index, total, document_id, error);
    }

    /// Called once after every document of a batch has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        documents: AtomicUsize,
        failures: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_document_complete(
            &self,
            _index: usize,
            _total: usize,
            _document_id: &str,
            error: Option<&str>,
        ) {
            self.documents.fetch_add(1, Ordering::SeqCst);
            if error.is_some() {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_download(1, 2, "https://example.org/a.pdf", true);
        cb.on_batch_start(2);
        cb.on_document_start(1, 2, "a.pdf");
        cb.on_stage_start(Stage::Summarize);
        cb.on_stage_complete(Stage::Summarize, 12);
        cb.on_document_complete(1, 2, "a.pdf", None);
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        for stage in Stage::ORDER {
            tracker.on_stage_complete(stage, 1);
        }
        tracker.on_document_complete(1, 2, "a.pdf", None);
        tracker.on_document_complete(2, 2, "b.pdf", Some("Workflow timed out"));

        assert_eq!(*tracker.stages.lock().unwrap(), Stage::ORDER.to_vec());
        assert_eq!(tracker.documents.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_stage_start(Stage::ExtractEntities);
    }
}
