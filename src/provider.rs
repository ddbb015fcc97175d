//! Credential validation hook.
//!
//! The host calls [`ToolProvider::validate_credentials`] when a user saves
//! credentials. Validation is a real round trip: build the converter the tool
//! would build, then convert a small bundled JPEG once. Anything that goes
//! wrong (malformed endpoint, unreachable host, rejected key) is reported as
//! [`ToolError::InvalidCredentials`].

use crate::backend::select_backend;
use crate::credentials::{Credentials, KNOWN_KEYS};
use crate::engine::{ConversionResult, ConverterFactory, MarkItDownFactory};
use crate::error::ToolError;
use crate::hints::StreamInfo;
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Known-good sample converted by the trial run.
pub const SAMPLE_IMAGE: &[u8] = include_bytes!("../test_file/hello.jpeg");

/// Host hook for credential validation.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn validate_credentials(&self, credentials: &Credentials) -> Result<(), ToolError>;
}

/// Validates markitdown credentials with one trial conversion.
#[derive(Clone)]
pub struct MarkitdownProvider {
    factory: Arc<dyn ConverterFactory>,
}

impl Default for MarkitdownProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkitdownProvider {
    /// Provider backed by the built-in engine.
    pub fn new() -> Self {
        Self::with_factory(Arc::new(MarkItDownFactory))
    }

    pub fn with_factory(factory: Arc<dyn ConverterFactory>) -> Self {
        Self { factory }
    }

    async fn trial_conversion(
        &self,
        credentials: &Credentials,
    ) -> Result<ConversionResult, ToolError> {
        let configured = credentials.configured_keys();
        for key in configured.iter().filter(|k| !KNOWN_KEYS.contains(*k)) {
            warn!("Ignoring unrecognised credential '{}'", key);
        }
        let config = select_backend(credentials, false);
        info!(
            "Validating credentials with backend '{}' (configured: {:?})",
            config.backend.kind(),
            configured
        );

        let converter = self
            .factory
            .build(&config)
            .map_err(ToolError::invalid_credentials)?;

        let mut sample = tempfile::Builder::new()
            .prefix("markitdown-sample-")
            .suffix(".jpeg")
            .tempfile()
            .map_err(ToolError::invalid_credentials)?;
        sample
            .write_all(SAMPLE_IMAGE)
            .map_err(ToolError::invalid_credentials)?;
        let path = sample.path().to_string_lossy().to_string();

        let hint = StreamInfo {
            extension: Some(".jpeg".into()),
            mime_type: Some("image/jpeg".into()),
        };
        // `sample` is deleted when it goes out of scope after the conversion.
        converter
            .convert(&path, Some(&hint), false)
            .await
            .map_err(ToolError::invalid_credentials)
    }
}

#[async_trait]
impl ToolProvider for MarkitdownProvider {
    async fn validate_credentials(&self, credentials: &Credentials) -> Result<(), ToolError> {
        match self.trial_conversion(credentials).await {
            Ok(result) => {
                info!(
                    "Credentials valid (trial produced {} bytes of markdown)",
                    result.markdown.len()
                );
                Ok(())
            }
            Err(e) => {
                error!("Credential validation failed: {}", e);
                Err(e)
            }
        }
    }
}
