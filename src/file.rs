//! Host file references and URL normalization.
//!
//! The host materializes uploaded files as a reference carrying a URL plus
//! optional extension and MIME hints. In remote-debug mode the URL is a path
//! relative to the plugin's debug host (`/files/abc.png`), which the engine
//! cannot fetch as-is, so it is rewritten to an absolute `http://` URL first.

use crate::error::ToolError;
use crate::hints::{normalize_extension, normalize_mime_type, StreamInfo};
use crate::net::AddressDiscovery;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable overriding the discovered debug host.
pub const DEBUG_HOST_ENV: &str = "EXPOSE_PLUGIN_DEBUGGING_HOST";

static RE_ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").unwrap());

/// A file handed to the tool by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Absolute `http(s)://` URL or a path relative to the debug host.
    pub url: String,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl FileRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extension: None,
            mime_type: None,
            filename: None,
        }
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = Some(ext.into());
        self
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Normalized format hints for this file, if any.
    ///
    /// # Errors
    /// [`ToolError::BadRequest`] if the MIME hint is malformed.
    pub fn stream_info(&self) -> Result<Option<StreamInfo>, ToolError> {
        let extension = normalize_extension(self.extension.as_deref());
        let mime_type = normalize_mime_type(self.mime_type.as_deref())?;
        debug!(?extension, ?mime_type, "format hints");
        Ok(StreamInfo::from_hints(extension, mime_type))
    }
}

/// Check if the URL is already absolute.
pub fn is_absolute_url(url: &str) -> bool {
    RE_ABSOLUTE_URL.is_match(url)
}

/// Make `url` absolute against the debug host.
///
/// Absolute URLs are returned unchanged. Otherwise the host is `host_override`
/// when non-blank, or the address reported by `discovery`.
pub fn resolve_url(
    url: &str,
    host_override: Option<&str>,
    discovery: &dyn AddressDiscovery,
) -> String {
    if is_absolute_url(url) {
        return url.to_string();
    }
    let host = match host_override.map(str::trim).filter(|h| !h.is_empty()) {
        Some(h) => h.to_string(),
        None => discovery.discover_outbound_address().to_string(),
    };
    let resolved = format!("http://{host}{url}");
    debug!("Rewrote relative file URL '{}' → '{}'", url, resolved);
    resolved
}

/// Read [`DEBUG_HOST_ENV`], treating blank values as unset.
pub fn debug_host_from_env() -> Option<String> {
    std::env::var(DEBUG_HOST_ENV)
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
