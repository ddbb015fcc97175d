//! Tool invocation hook.
//!
//! [`MarkitdownTool::invoke`] is a straight pipeline:
//!
//! ```text
//! check file ──▶ hints ──▶ absolute URL ──▶ select backend ──▶ convert ──▶ 2 messages
//! ```
//!
//! Parameter problems are reported before any conversion is attempted.
//! Conversion failures are returned unchanged inside
//! [`ToolError::ConversionFailed`], and no partial output is produced.

use crate::backend::select_backend;
use crate::credentials::Credentials;
use crate::engine::{ConversionResult, ConverterFactory, MarkItDownFactory};
use crate::error::ToolError;
use crate::file::{debug_host_from_env, resolve_url, FileRef};
use crate::net::{AddressDiscovery, UdpProbe};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Parameters of one invocation, as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(default)]
    pub file: Option<FileRef>,
    /// Inline embedded images as data URIs. Default: false.
    #[serde(default)]
    pub keep_data_uris: bool,
}

impl ToolParameters {
    pub fn for_file(file: FileRef) -> Self {
        Self {
            file: Some(file),
            keep_data_uris: false,
        }
    }
}

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolInvokeMessage {
    Text { text: String },
    Json { json: Value },
}

impl ToolInvokeMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn json(json: Value) -> Self {
        Self::Json { json }
    }
}

/// Host hook for tool invocation.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the accepted parameters.
    fn parameters(&self) -> Value;

    async fn invoke(&self, params: ToolParameters) -> Result<Vec<ToolInvokeMessage>, ToolError>;
}

/// Runtime settings that do not come from credentials.
#[derive(Clone)]
pub struct ToolSettings {
    /// Host used for relative file URLs. Overrides discovery when set.
    pub debug_host: Option<String>,
    pub discovery: Arc<dyn AddressDiscovery>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            debug_host: None,
            discovery: Arc::new(UdpProbe::default()),
        }
    }
}

impl ToolSettings {
    /// Read the debug-host override from `EXPOSE_PLUGIN_DEBUGGING_HOST`.
    pub fn from_env() -> Self {
        Self {
            debug_host: debug_host_from_env(),
            ..Self::default()
        }
    }
}

/// Converts a host file to markdown.
#[derive(Clone)]
pub struct MarkitdownTool {
    credentials: Credentials,
    settings: ToolSettings,
    factory: Arc<dyn ConverterFactory>,
}

impl MarkitdownTool {
    /// Tool backed by the built-in engine, with settings from the environment.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            settings: ToolSettings::from_env(),
            factory: Arc::new(MarkItDownFactory),
        }
    }

    pub fn with_settings(mut self, settings: ToolSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ConverterFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Shape a result into the two outbound messages: markdown text first, then
/// `{title, text_content}`.
pub fn result_messages(result: ConversionResult) -> Vec<ToolInvokeMessage> {
    vec![
        ToolInvokeMessage::text(result.markdown),
        ToolInvokeMessage::json(json!({
            "title": result.title,
            "text_content": result.text_content,
        })),
    ]
}

#[async_trait]
impl Tool for MarkitdownTool {
    fn name(&self) -> &'static str {
        "markitdown"
    }

    fn description(&self) -> &'static str {
        "Convert a document (office files, PDF, images, HTML, text) to Markdown."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "object",
                    "description": "The file to convert",
                    "properties": {
                        "url": { "type": "string" },
                        "extension": { "type": "string" },
                        "mime_type": { "type": "string" },
                        "filename": { "type": "string" }
                    },
                    "required": ["url"]
                },
                "keep_data_uris": {
                    "type": "boolean",
                    "description": "Keep embedded images as base64 data URIs",
                    "default": false
                }
            },
            "required": ["file"]
        })
    }

    async fn invoke(&self, params: ToolParameters) -> Result<Vec<ToolInvokeMessage>, ToolError> {
        let Some(file) = params.file else {
            error!("file is required");
            return Err(ToolError::bad_request("file is required"));
        };

        let stream_info = file.stream_info()?;
        let url = resolve_url(
            &file.url,
            self.settings.debug_host.as_deref(),
            self.settings.discovery.as_ref(),
        );

        let config = select_backend(&self.credentials, params.keep_data_uris);
        info!(
            "Invoking markitdown on {} (backend '{}', keep_data_uris={})",
            url,
            config.backend.kind(),
            params.keep_data_uris
        );
        let converter = self.factory.build(&config)?;

        let result = converter
            .convert(&url, stream_info.as_ref(), params.keep_data_uris)
            .await?;

        Ok(result_messages(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_in_order() {
        let msgs = result_messages(ConversionResult {
            markdown: "# T".into(),
            title: Some("T".into()),
            text_content: "T body".into(),
        });
        assert_eq!(
            msgs,
            vec![
                ToolInvokeMessage::text("# T"),
                ToolInvokeMessage::json(json!({"title": "T", "text_content": "T body"})),
            ]
        );
    }

    #[test]
    fn missing_title_serialises_as_null() {
        let msgs = result_messages(ConversionResult::new("x".into(), None));
        assert_eq!(msgs[1], ToolInvokeMessage::json(json!({"title": null, "text_content": "x"})));
    }

    #[test]
    fn message_wire_format_is_tagged() {
        let v = serde_json::to_value(ToolInvokeMessage::text("hi")).unwrap();
        assert_eq!(v, json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn parameters_default_keep_data_uris_false() {
        let p: ToolParameters = serde_json::from_str(r#"{"file": {"url": "/f"}}"#).unwrap();
        assert!(!p.keep_data_uris);
        assert_eq!(p.file.unwrap().url, "/f");
    }

    #[test]
    fn schema_requires_file() {
        let tool = MarkitdownTool::new(Credentials::new());
        assert_eq!(tool.name(), "markitdown");
        assert_eq!(tool.parameters()["required"][0], "file");
    }

    #[test]
    fn description_mentions_markdown() {
        let tool = MarkitdownTool::new(Credentials::new());
        assert!(tool.description().to_lowercase().contains("markdown"));
    }
}
