//! Batch download of search results into a per-topic folder.
//!
//! Files are named `paper_{i}_{hash}.pdf`, where `hash` is the first 32 hex
//! characters of the SHA-256 of the URL, so re-running a query skips papers
//! already on disk.

use crate::config::AnalysisConfig;
use crate::error::InsightError;
use crate::pipeline::extract::topic_folder;
use crate::pipeline::input::{check_magic, fetch_pdf_bytes};
use crate::pipeline::search::{http_client, search_scholar};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a batch download produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Folder the files were written to.
    pub folder: PathBuf,
    /// Links returned by the search.
    pub links: Vec<String>,
    /// Files present on disk afterwards, fresh or already cached.
    pub saved: Vec<PathBuf>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.saved.len()
    }
}

/// File name for link number `index` (1-based).
pub fn paper_file_name(index: usize, url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("paper_{}_{}.pdf", index, &digest[..32])
}

/// Search for `query` and download up to `num_results` PDFs into
/// `base_folder/<query_with_underscores>`.
///
/// Individual failures are logged and skipped; only folder creation and
/// the search itself are fatal.
pub async fn download_papers(
    query: &str,
    base_folder: &Path,
    num_results: usize,
    config: &AnalysisConfig,
) -> Result<DownloadReport, InsightError> {
    let folder = topic_folder(base_folder, query);
    tokio::fs::create_dir_all(&folder)
        .await
        .map_err(|e| InsightError::Internal(format!("Failed to create {}: {}", folder.display(), e)))?;

    let links = search_scholar(query, num_results, config).await?;
    if links.is_empty() {
        warn!("No PDF links found for '{}'", query);
    }

    let client = http_client(config.download_timeout_secs).map_err(|e| InsightError::DownloadFailed {
        url: config.scholar_base_url.clone(),
        reason: e.to_string(),
    })?;

    let total = links.len();
    let mut saved = Vec::new();
    for (i, url) in links.iter().enumerate() {
        let index = i + 1;
        let path = folder.join(paper_file_name(index, url));

        let ok = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("Already downloaded: {}", path.display());
            true
        } else {
            match download_one(&client, url, &path, config.download_timeout_secs).await {
                Ok(()) => {
                    info!("Downloaded {} → {}", url, path.display());
                    true
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    false
                }
            }
        };

        if ok {
            saved.push(path);
        }
        if let Some(ref cb) = config.progress_callback {
            cb.on_download(index, total, url, ok);
        }
    }

    info!("{}/{} paper(s) available in {}", saved.len(), total, folder.display());
    Ok(DownloadReport {
        folder,
        links,
        saved,
    })
}

async fn download_one(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    timeout_secs: u64,
) -> Result<(), InsightError> {
    let bytes = fetch_pdf_bytes(client, url, timeout_secs).await?;
    check_magic(&bytes, path)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| InsightError::Internal(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_stable_and_indexed() {
        let a = paper_file_name(1, "https://example.org/a.pdf");
        let b = paper_file_name(1, "https://example.org/a.pdf");
        assert_eq!(a, b);
        assert!(a.starts_with("paper_1_"));
        assert!(a.ends_with(".pdf"));
        // "paper_1_" + 32 hex + ".pdf"
        assert_eq!(a.len(), 8 + 32 + 4);
        assert_ne!(a, paper_file_name(2, "https://example.org/a.pdf"));
        assert_ne!(a, paper_file_name(1, "https://example.org/b.pdf"));
    }

    #[test]
    fn report_counts_saved_files() {
        let report = DownloadReport {
            folder: PathBuf::from("data/q"),
            links: vec!["a".into(), "b".into()],
            saved: vec![PathBuf::from("data/q/paper_1_x.pdf")],
        };
        assert_eq!(report.downloaded(), 1);
    }
}
