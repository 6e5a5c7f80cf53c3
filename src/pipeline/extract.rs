//! PDF text extraction via pdfium.
//!
//! pdfium keeps thread-local state and blocks, so every call runs on the
//! blocking pool through `spawn_blocking`.

use crate::error::InsightError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Plain text of one document, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub id: String,
    pub text: String,
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH`, then the working directory,
/// then the system loader.
pub fn bind_pdfium() -> Result<Pdfium, InsightError> {
    if let Ok(explicit) = std::env::var("PDFIUM_LIB_PATH") {
        if !explicit.is_empty() {
            let bindings = Pdfium::bind_to_library(&explicit).map_err(|e| {
                InsightError::PdfiumBindingFailed(format!("{explicit}: {e:?}"))
            })?;
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| InsightError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Concatenated text of the first `max_pages` pages of `pdf_path`.
pub async fn extract_text(pdf_path: &Path, max_pages: usize) -> Result<String, InsightError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path, max_pages))
        .await
        .map_err(|e| InsightError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_text_blocking(pdf_path: &Path, max_pages: usize) -> Result<String, InsightError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| InsightError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    let limit = total.min(max_pages);
    debug!("{}: reading {} of {} pages", pdf_path.display(), limit, total);

    let mut text = String::new();
    for idx in 0..limit {
        let page = pages
            .get(idx as u16)
            .map_err(|e| InsightError::TextExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
        let page_text = page.text().map_err(|e| InsightError::TextExtractionFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        text.push_str(&page_text.all());
    }

    Ok(text)
}

/// `true` if pdfium opens the file and finds at least one page.
pub async fn is_valid_pdf(pdf_path: &Path) -> bool {
    let path = pdf_path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || -> Result<usize, InsightError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&path, None)
            .map_err(|e| InsightError::CorruptPdf {
                path: path.clone(),
                detail: format!("{:?}", e),
            })?;
        Ok(document.pages().len() as usize)
    })
    .await;

    match result {
        Ok(Ok(pages)) => pages > 0,
        Ok(Err(e)) => {
            warn!("Invalid PDF {}: {}", pdf_path.display(), e);
            false
        }
        Err(e) => {
            warn!("Validity check for {} panicked: {}", pdf_path.display(), e);
            false
        }
    }
}

/// Folder holding the downloads for `topic`: spaces become underscores.
pub fn topic_folder(base_folder: &Path, topic: &str) -> PathBuf {
    base_folder.join(topic.replace(' ', "_"))
}

/// `*.pdf` files directly inside `folder`, sorted by file name.
pub async fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>, InsightError> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|_| InsightError::NoDocuments {
            folder: folder.to_path_buf(),
        })?;

    let mut pdfs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| InsightError::Internal(e.to_string()))?
    {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Extract the first `num_files` valid PDFs downloaded for `topic`.
///
/// A missing or empty folder, or one without any valid PDF, is
/// [`InsightError::NoDocuments`]. Documents whose extraction fails are
/// skipped.
pub async fn collect_topic_texts(
    base_folder: &Path,
    topic: &str,
    max_pages: usize,
    num_files: usize,
) -> Result<Vec<TextDocument>, InsightError> {
    let folder = topic_folder(base_folder, topic);
    let no_documents = || InsightError::NoDocuments {
        folder: folder.clone(),
    };

    let candidates = list_pdfs(&folder).await?;
    if candidates.is_empty() {
        return Err(no_documents());
    }

    let mut valid = Vec::new();
    for path in candidates {
        if is_valid_pdf(&path).await {
            valid.push(path);
        }
    }
    if valid.is_empty() {
        return Err(no_documents());
    }

    let mut documents = Vec::new();
    for path in valid.into_iter().take(num_files) {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match extract_text(&path, max_pages).await {
            Ok(text) => documents.push(TextDocument { id, text }),
            Err(e) => warn!("Skipping {}: {}", id, e),
        }
    }

    info!("Collected text from {} PDF(s) in {}", documents.len(), folder.display());
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn topic_folder_replaces_spaces() {
        let folder = topic_folder(Path::new("data"), "graph neural networks");
        assert_eq!(folder, PathBuf::from("data/graph_neural_networks"));
    }

    #[tokio::test]
    async fn list_pdfs_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[tokio::test]
    async fn missing_topic_folder_has_no_documents() {
        let dir = TempDir::new().unwrap();
        let err = collect_topic_texts(dir.path(), "nothing here", 10, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::NoDocuments { .. }));
    }

    #[tokio::test]
    async fn empty_topic_folder_has_no_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("empty_topic")).unwrap();
        let err = collect_topic_texts(dir.path(), "empty topic", 10, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::NoDocuments { .. }));
    }
}
