//! Persistence of [`DocumentRecord`]s.
//!
//! [`ResultSink`] is the storage seam; [`JsonLinesSink`] appends one JSON
//! object per line to a local file. A managed datastore plugs in by
//! implementing the trait.

use crate::error::InsightError;
use crate::output::DocumentRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Where analysed documents end up.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist one record.
    async fn store(&self, record: &DocumentRecord) -> Result<(), InsightError>;
}

/// Appends records to a JSON Lines file, creating parent directories.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // Serialises appends from concurrent callers so lines never interleave.
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_failed(&self, source: std::io::Error) -> InsightError {
        InsightError::SinkWriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn store(&self, record: &DocumentRecord) -> Result<(), InsightError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.write_failed(e))?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_failed(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.write_failed(e))?;
        file.flush().await.map_err(|e| self.write_failed(e))?;

        debug!("Stored record {} in {}", record.document_id, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{AnalysisResults, DocumentRecord};
    use tempfile::TempDir;

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("nested/results.jsonl"));

        let results = AnalysisResults {
            summary: Some("first".into()),
            ..Default::default()
        };
        sink.store(&DocumentRecord::from_results("a", &results))
            .await
            .unwrap();
        sink.store(&DocumentRecord::from_results("b", &results))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: DocumentRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.summary, "first");
        assert_ne!(first.document_id, serde_json::from_str::<DocumentRecord>(lines[1]).unwrap().document_id);
    }
}
