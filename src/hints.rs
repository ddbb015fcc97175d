//! Format hints: the optional (extension, MIME type) pair that lets the
//! engine skip content sniffing.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Extension and MIME type hints for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Lowercase, with a leading `.` (e.g. `.pdf`).
    pub extension: Option<String>,
    /// A `type/subtype` string, trimmed.
    pub mime_type: Option<String>,
}

impl StreamInfo {
    /// Build a hint if at least one part is present.
    pub fn from_hints(extension: Option<String>, mime_type: Option<String>) -> Option<Self> {
        if extension.is_none() && mime_type.is_none() {
            return None;
        }
        Some(Self {
            extension,
            mime_type,
        })
    }

    /// The MIME type without parameters (`text/html; charset=utf-8` → `text/html`),
    /// lowercased.
    pub fn essence(&self) -> Option<String> {
        self.mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
    }
}

/// Trim, lowercase and prefix with `.`. Blank input yields `None`.
///
/// Idempotent: `".PDF"`, `"pdf"` and `".pdf"` all become `.pdf`.
pub fn normalize_extension(raw: Option<&str>) -> Option<String> {
    let ext = raw?.trim().to_lowercase();
    if ext.is_empty() {
        return None;
    }
    if ext.starts_with('.') {
        Some(ext)
    } else {
        Some(format!(".{ext}"))
    }
}

/// Trim a MIME hint and check it has exactly one `/`. Blank input yields
/// `Ok(None)`.
///
/// # Errors
/// [`ToolError::BadRequest`] with message `Invalid MIME type: <value>`.
pub fn normalize_mime_type(raw: Option<&str>) -> Result<Option<String>, ToolError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mime = raw.trim();
    if mime.is_empty() {
        return Ok(None);
    }
    if mime.matches('/').count() != 1 {
        error!("Invalid MIME type: {}", mime);
        return Err(ToolError::bad_request(format!("Invalid MIME type: {mime}")));
    }
    Ok(Some(mime.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_normalization_is_idempotent() {
        for raw in [".PDF", "pdf", ".pdf", "  Pdf "] {
            assert_eq!(normalize_extension(Some(raw)).as_deref(), Some(".pdf"), "{raw}");
        }
        let once = normalize_extension(Some("DocX")).unwrap();
        assert_eq!(normalize_extension(Some(&once)), Some(once));
    }

    #[test]
    fn blank_extension_is_absent() {
        assert_eq!(normalize_extension(None), None);
        assert_eq!(normalize_extension(Some("   ")), None);
    }

    #[test]
    fn mime_with_one_slash_accepted() {
        assert_eq!(
            normalize_mime_type(Some(" image/png ")).unwrap().as_deref(),
            Some("image/png")
        );
        assert_eq!(normalize_mime_type(Some("")).unwrap(), None);
        assert_eq!(normalize_mime_type(None).unwrap(), None);
    }

    #[test]
    fn mime_without_exactly_one_slash_rejected() {
        for bad in ["imagepng", "a/b/c", "//"] {
            let err = normalize_mime_type(Some(bad)).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid MIME type: {bad}"));
        }
    }

    #[test]
    fn stream_info_only_when_a_hint_exists() {
        assert_eq!(StreamInfo::from_hints(None, None), None);
        let info = StreamInfo::from_hints(Some(".pdf".into()), None).unwrap();
        assert_eq!(info.extension.as_deref(), Some(".pdf"));
        assert_eq!(info.mime_type, None);
    }

    #[test]
    fn essence_strips_parameters() {
        let info = StreamInfo {
            extension: None,
            mime_type: Some("Text/Plain; charset=utf-8".into()),
        };
        assert_eq!(info.essence().as_deref(), Some("text/plain"));
    }
}
