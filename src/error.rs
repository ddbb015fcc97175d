//! Error types for the markitdown tool.
//!
//! Two distinct error types reflect two distinct audiences:
//!
//! * [`ToolError`] is **host-facing**: what the plugin runtime sees when a
//!   credential check or a tool invocation fails. Its variants separate
//!   user-fixable problems (bad credentials, bad parameters) from backend
//!   faults, so a host can decide whether to prompt the user or report an
//!   outage.
//!
//! * [`ConvertError`] is **engine-facing**: why the conversion engine could not
//!   produce markdown (download failure, unsupported format, LLM or OCR
//!   error). Wrapped into [`ToolError::ConversionFailed`] at the tool boundary
//!   with the original error kept as the source.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors surfaced to the host runtime.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Trial construction or conversion failed while validating credentials.
    ///
    /// `message` is the underlying error's display text, unchanged.
    #[error("{message}")]
    InvalidCredentials {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Invocation parameters were missing or malformed. Raised before any
    /// network activity.
    #[error("{reason}")]
    BadRequest { reason: String },

    /// The conversion engine failed on a well-formed request.
    #[error("Conversion failed: {source}")]
    ConversionFailed {
        #[from]
        source: ConvertError,
    },
}

impl ToolError {
    /// Build an [`ToolError::InvalidCredentials`] that keeps `err` as its cause.
    pub fn invalid_credentials<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidCredentials {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// True when the user can fix the failure by changing their input.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::BadRequest { .. }
        )
    }
}

/// All errors returned by the conversion engine.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Local source file was not found.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The source string is neither a readable path nor an HTTP/HTTPS URL.
    #[error("Invalid source '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP download of the source failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// HTTP download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// No converter accepts the detected format with the selected backend.
    #[error("Unsupported format: {detail}")]
    UnsupportedFormat { detail: String },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The LLM endpoint returned a non-success response.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// A backend rejected the supplied key (HTTP 401/403).
    #[error("Authentication error from {service}: {detail}")]
    AuthError { service: String, detail: String },

    /// Azure Document Intelligence could not analyse the document.
    #[error("Document Intelligence error: {detail}")]
    OcrFailed { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn bad_request_display_is_reason_verbatim() {
        let e = ToolError::bad_request("file is required");
        assert_eq!(e.to_string(), "file is required");
        assert!(e.is_user_fixable());
    }

    #[test]
    fn invalid_credentials_keeps_cause() {
        let cause = ConvertError::AuthError {
            service: "openai".into(),
            detail: "invalid key".into(),
        };
        let e = ToolError::invalid_credentials(cause);
        assert_eq!(
            e.to_string(),
            "Authentication error from openai: invalid key"
        );
        let source = e.source().expect("cause must be preserved");
        assert!(source.to_string().contains("invalid key"));
    }

    #[test]
    fn conversion_failed_is_not_user_fixable() {
        let e: ToolError = ConvertError::UnsupportedFormat {
            detail: "application/zip".into(),
        }
        .into();
        assert!(!e.is_user_fixable());
        assert!(e.to_string().contains("application/zip"));
    }

    #[test]
    fn download_timeout_display() {
        let e = ConvertError::DownloadTimeout {
            url: "http://h/x.pdf".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("http://h/x.pdf"));
    }
}
