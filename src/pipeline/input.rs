//! Input resolution: turn a path, URL or in-memory upload into a local PDF.
//!
//! pdfium needs a file-system path, so downloads and uploaded bytes are
//! written to temp storage owned by [`ResolvedInput`]. Dropping it removes the
//! file. Every variant is checked for the `%PDF` magic before it is returned.

use crate::error::InsightError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// A PDF ready to open, however it arrived.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the `TempDir` lives as long as the path is needed.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was an uploaded byte buffer.
    Uploaded(NamedTempFile),
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Uploaded(file) => file.path(),
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or HTTP(S) URL to a local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, InsightError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write uploaded bytes to a temp file and validate them.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, InsightError> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| InsightError::Internal(format!("Failed to create temp file: {e}")))?;

    check_magic(bytes, file.path())?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| InsightError::Internal(format!("Failed to write temp file: {e}")))?;

    debug!("Uploaded PDF ({} bytes) at {}", bytes.len(), file.path().display());
    Ok(ResolvedInput::Uploaded(file))
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, InsightError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(InsightError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(InsightError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(InsightError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(InsightError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, InsightError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InsightError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let bytes = fetch_pdf_bytes(&client, url, timeout_secs).await?;

    let temp_dir = TempDir::new().map_err(|e| InsightError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    check_magic(&bytes, &file_path)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| InsightError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// GET `url` and return the body, mapping transport and status failures.
pub(crate) async fn fetch_pdf_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, InsightError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            InsightError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InsightError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(InsightError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| InsightError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(bytes.to_vec())
}

/// Reject buffers that do not start with `%PDF`.
pub(crate) fn check_magic(bytes: &[u8], path: &Path) -> Result<(), InsightError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(InsightError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_comes_from_last_segment() {
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/1706.03762v7.pdf"),
            "1706.03762v7.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
    }

    #[test]
    fn missing_local_file_is_not_found() {
        let err = resolve_local("/definitely/not/here.pdf").err().unwrap();
        assert!(matches!(err, InsightError::FileNotFound { .. }));
    }

    #[test]
    fn local_non_pdf_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let err = resolve_local(file.path().to_str().unwrap()).err().unwrap();
        match err {
            InsightError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn uploaded_bytes_land_in_a_temp_file() {
        let resolved = resolve_bytes(b"%PDF-1.7\n%fake").unwrap();
        let path = resolved.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7\n%fake");
        drop(resolved);
        assert!(!path.exists());
    }

    #[test]
    fn uploaded_non_pdf_is_rejected() {
        let err = resolve_bytes(b"PK").err().unwrap();
        match err {
            InsightError::NotAPdf { magic, .. } => assert_eq!(magic, [b'P', b'K', 0, 0]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
