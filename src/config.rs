//! Configuration for the conversion engine.
//!
//! Everything the engine needs for one call is carried by [`ConverterConfig`]:
//! the selected [`BackendConfig`], the data-URI flag, and the network limits.
//! Credentials are passed in explicitly rather than through process
//! environment variables, so concurrent calls with different credentials
//! cannot observe each other's keys.

use crate::backend::BackendConfig;
use crate::error::ConvertError;
use crate::file::is_absolute_url;

/// Prompt sent with every image when the LLM backend is selected.
pub const DEFAULT_CAPTION_PROMPT: &str = "Write a detailed caption for this image.";

/// Azure Document Intelligence API version used when none is configured.
pub const DEFAULT_DOCINTEL_API_VERSION: &str = "2024-07-31-preview";

/// Configuration for one [`crate::engine::MarkItDown`] instance.
///
/// Built via [`ConverterConfig::builder()`], with
/// [`ConverterConfig::default()`], or by [`crate::backend::select_backend`].
///
/// # Example
/// ```rust
/// use markitdown_tool::{BackendConfig, ConverterConfig};
///
/// let config = ConverterConfig::builder()
///     .backend(BackendConfig::Default)
///     .keep_data_uris(true)
///     .download_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert!(config.keep_data_uris);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterConfig {
    /// Augmentation backend. Default: [`BackendConfig::Default`].
    pub backend: BackendConfig,

    /// Inline embedded images as base64 data URIs in the markdown. Default: false.
    pub keep_data_uris: bool,

    /// Timeout for fetching the source document, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for each LLM / OCR HTTP request, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Delay between polls of an Azure analyze operation. Default: 1000.
    pub ocr_poll_interval_ms: u64,

    /// Upper bound on Azure analyze polls before giving up. Default: 120.
    pub ocr_max_polls: u32,

    /// Prompt used for LLM image captions. Default: [`DEFAULT_CAPTION_PROMPT`].
    pub caption_prompt: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Default,
            keep_data_uris: false,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            ocr_poll_interval_ms: 1000,
            ocr_max_polls: 120,
            caption_prompt: DEFAULT_CAPTION_PROMPT.to_string(),
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    /// A builder seeded with this configuration.
    pub fn to_builder(&self) -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: self.clone(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn keep_data_uris(mut self, v: bool) -> Self {
        self.config.keep_data_uris = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn ocr_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.ocr_poll_interval_ms = ms;
        self
    }

    pub fn ocr_max_polls(mut self, n: u32) -> Self {
        self.config.ocr_max_polls = n;
        self
    }

    pub fn caption_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.caption_prompt = prompt.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "download timeout must be ≥ 1s".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "API timeout must be ≥ 1s".into(),
            ));
        }
        if c.ocr_max_polls == 0 {
            return Err(ConvertError::InvalidConfig(
                "OCR poll budget must be ≥ 1".into(),
            ));
        }
        if c.caption_prompt.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "caption prompt must not be empty".into(),
            ));
        }
        match &c.backend {
            BackendConfig::AzureOcr { endpoint, .. } if !is_absolute_url(endpoint) => {
                return Err(ConvertError::InvalidConfig(format!(
                    "Document Intelligence endpoint must be an HTTP/HTTPS URL, got '{endpoint}'"
                )));
            }
            BackendConfig::LlmBacked { base_url, .. } if !is_absolute_url(base_url) => {
                return Err(ConvertError::InvalidConfig(format!(
                    "OpenAI base URL must be an HTTP/HTTPS URL, got '{base_url}'"
                )));
            }
            _ => {}
        }
        Ok(self.config)
    }
}
