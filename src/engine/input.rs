//! Source resolution: turn a path or URL into bytes plus derived hints.
//!
//! Hints derived here (extension from the file name, MIME type from the
//! `Content-Type` header) are only consulted when the caller's
//! [`StreamInfo`] does not identify a format; see [`super::detect`].

use crate::error::ConvertError;
use crate::file::is_absolute_url;
use crate::hints::{normalize_extension, StreamInfo};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// A fetched source document.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub bytes: Vec<u8>,
    /// Hints derived from the locator and transport.
    pub derived: StreamInfo,
    /// Last path segment, when one exists.
    pub filename: Option<String>,
}

/// Resolve the input string to bytes.
///
/// URLs are downloaded with `client`; anything else is read from disk.
pub async fn resolve_source(
    client: &reqwest::Client,
    input: &str,
    timeout_secs: u64,
) -> Result<ResolvedSource, ConvertError> {
    if input.trim().is_empty() {
        return Err(ConvertError::InvalidInput {
            input: input.to_string(),
            reason: "empty source".into(),
        });
    }
    if is_absolute_url(input) {
        download_url(client, input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local file.
async fn read_local(path_str: &str) -> Result<ResolvedSource, ConvertError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConvertError::FileNotFound { path });
        }
        Err(e) => {
            return Err(ConvertError::InvalidInput {
                input: path_str.to_string(),
                reason: e.to_string(),
            });
        }
    };

    debug!("Read local source: {} ({} bytes)", path.display(), bytes.len());
    let filename = file_name(&path);
    Ok(ResolvedSource {
        bytes,
        derived: StreamInfo {
            extension: extension_of(filename.as_deref()),
            mime_type: None,
        },
        filename,
    })
}

/// Download a URL into memory.
async fn download_url(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
) -> Result<ResolvedSource, ConvertError> {
    info!("Downloading source from: {}", url);

    let response = client
        .get(url)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                ConvertError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                ConvertError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| v.matches('/').count() == 1);

    let filename = extract_filename(url);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    info!("Downloaded {} bytes", bytes.len());

    Ok(ResolvedSource {
        bytes,
        derived: StreamInfo {
            extension: extension_of(filename.as_deref()),
            mime_type,
        },
        filename,
    })
}

/// Extract the last path segment of a URL, if it looks like a file name.
fn extract_filename(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

fn extension_of(filename: Option<&str>) -> Option<String> {
    let (_, ext) = filename?.rsplit_once('.')?;
    normalize_extension(Some(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://h/files/report.PDF?sig=1").as_deref(),
            Some("report.PDF")
        );
        assert_eq!(extract_filename("https://h/files/"), None);
        assert_eq!(extract_filename("https://h/files/blob"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Some("a.B.Docx")).as_deref(), Some(".docx"));
        assert_eq!(extension_of(Some("README")), None);
        assert_eq!(extension_of(None), None);
    }

    #[tokio::test]
    async fn reads_local_file_with_extension_hint() {
        let mut tmp = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        tmp.write_all(b"# hi\n").unwrap();
        let client = reqwest::Client::new();

        let src = resolve_source(&client, tmp.path().to_str().unwrap(), 5)
            .await
            .unwrap();
        assert_eq!(src.bytes, b"# hi\n");
        assert_eq!(src.derived.extension.as_deref(), Some(".md"));
    }

    #[tokio::test]
    async fn missing_local_file_is_file_not_found() {
        let client = reqwest::Client::new();
        let err = resolve_source(&client, "/definitely/not/here.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn embedded_url_is_treated_as_local_path() {
        let client = reqwest::Client::new();
        let err = resolve_source(&client, "/cache?u=https://example.com/doc.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn empty_source_is_invalid_input() {
        let client = reqwest::Client::new();
        let err = resolve_source(&client, "  ", 5).await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput { .. }));
    }
}
