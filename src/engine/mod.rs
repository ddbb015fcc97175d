//! The conversion engine behind the tool.
//!
//! Provider and tool only see the [`DocumentConverter`] contract:
//!
//! ```text
//! convert(source, stream_info?, keep_data_uris) -> ConversionResult
//! ```
//!
//! and obtain converters through a [`ConverterFactory`], so the engine can be
//! replaced without touching the adapter code. [`MarkItDown`] is the built-in
//! implementation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ detect ──▶ { text | image(+llm) | ocr } ──▶ postprocess
//! (path/URL) (hints/magic)                              (cleanup)
//! ```
//!
//! 1. [`input`]: fetch the source into memory and derive hints from it
//! 2. [`detect`]: pick a [`detect::Format`] from hints, then magic bytes
//! 3. [`text`]: plain text, markdown, JSON and HTML need no backend
//! 4. [`llm`]: caption images via an OpenAI-compatible endpoint
//! 5. [`ocr`]: Azure Document Intelligence for PDFs, office files, images
//! 6. [`postprocess`]: deterministic whitespace and fence cleanup

pub mod detect;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod text;

use crate::backend::BackendConfig;
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::hints::StreamInfo;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use detect::Format;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Output of one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub markdown: String,
    pub title: Option<String>,
    /// Plain-text rendering of the document. For every converter in this
    /// crate it is the same text as `markdown`.
    pub text_content: String,
}

impl ConversionResult {
    pub fn new(markdown: String, title: Option<String>) -> Self {
        Self {
            text_content: markdown.clone(),
            markdown,
            title,
        }
    }
}

/// A document-to-markdown converter.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert the document at `source` (local path or HTTP/HTTPS URL).
    ///
    /// `stream_info` hints override anything derived from the source itself.
    /// `keep_data_uris` inlines embedded images as base64 data URIs.
    async fn convert(
        &self,
        source: &str,
        stream_info: Option<&StreamInfo>,
        keep_data_uris: bool,
    ) -> Result<ConversionResult, ConvertError>;
}

/// Builds a converter for a configuration.
pub trait ConverterFactory: Send + Sync {
    fn build(&self, config: &ConverterConfig) -> Result<Arc<dyn DocumentConverter>, ConvertError>;
}

/// Factory for the built-in [`MarkItDown`] engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkItDownFactory;

impl ConverterFactory for MarkItDownFactory {
    fn build(&self, config: &ConverterConfig) -> Result<Arc<dyn DocumentConverter>, ConvertError> {
        Ok(Arc::new(MarkItDown::new(config.clone())?))
    }
}

/// Which backend client, if any, the engine holds.
#[derive(Debug, Clone)]
enum Augmentation {
    None,
    Llm(llm::LlmClient),
    Ocr(ocr::AzureDocIntel),
}

/// The built-in conversion engine.
#[derive(Debug, Clone)]
pub struct MarkItDown {
    config: ConverterConfig,
    http: reqwest::Client,
    augmentation: Augmentation,
}

impl MarkItDown {
    /// Validate `config` and build the HTTP and backend clients.
    pub fn new(config: ConverterConfig) -> Result<Self, ConvertError> {
        let config = config.to_builder().build()?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.api_timeout_secs))
            .user_agent(concat!("markitdown-tool/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;

        let augmentation = match &config.backend {
            BackendConfig::Default => Augmentation::None,
            BackendConfig::LlmBacked {
                base_url,
                api_key,
                model,
            } => Augmentation::Llm(llm::LlmClient::new(
                http.clone(),
                base_url,
                api_key,
                model,
                config.api_timeout_secs,
            )),
            BackendConfig::AzureOcr {
                endpoint,
                credential,
                api_version,
            } => Augmentation::Ocr(ocr::AzureDocIntel::new(
                http.clone(),
                endpoint,
                credential.clone(),
                api_version.clone(),
                config.api_timeout_secs,
                config.ocr_poll_interval_ms,
                config.ocr_max_polls,
            )),
        };
        debug!("Built converter with backend {:?}", config.backend);

        Ok(Self {
            config,
            http,
            augmentation,
        })
    }

    async fn convert_image(
        &self,
        bytes: &[u8],
        mime: &str,
        keep_data_uris: bool,
    ) -> Result<ConversionResult, ConvertError> {
        let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(bytes));

        let caption = match &self.augmentation {
            Augmentation::Llm(client) => {
                info!("Captioning image with model {}", client.model());
                let raw = client.caption(&self.config.caption_prompt, &data_uri).await?;
                Some(postprocess::clean_caption(&raw)).filter(|c| !c.is_empty())
            }
            _ => None,
        };

        let mut md = String::new();
        if let Some(ref caption) = caption {
            md.push_str("# Description:\n");
            md.push_str(caption);
            md.push_str("\n\n");
        }
        if keep_data_uris {
            let alt = caption.as_deref().unwrap_or("image");
            md.push_str(&format!("![{}]({})\n", alt.replace(['[', ']'], ""), data_uri));
        }
        Ok(ConversionResult::new(
            postprocess::clean_markdown(&md),
            None,
        ))
    }
}

#[async_trait]
impl DocumentConverter for MarkItDown {
    async fn convert(
        &self,
        source: &str,
        stream_info: Option<&StreamInfo>,
        keep_data_uris: bool,
    ) -> Result<ConversionResult, ConvertError> {
        info!("Converting: {}", source);
        let resolved =
            input::resolve_source(&self.http, source, self.config.download_timeout_secs).await?;

        let format = detect::detect_format(stream_info, &resolved.derived, &resolved.bytes);
        debug!(caller = ?stream_info, derived = ?resolved.derived, ?format, "detected format");

        let result = match (&self.augmentation, &format) {
            (Augmentation::Ocr(client), f) if f.is_ocr_eligible() => {
                let markdown = client.analyze(resolved.bytes).await?;
                let markdown = postprocess::clean_markdown(&markdown);
                let title = markdown
                    .lines()
                    .find_map(|l| l.strip_prefix("# "))
                    .map(|t| t.trim().to_string());
                ConversionResult::new(markdown, title)
            }
            (_, Format::Image(mime)) => {
                self.convert_image(&resolved.bytes, mime, keep_data_uris)
                    .await?
            }
            (_, Format::PlainText | Format::Markdown) => text::convert_text(&resolved.bytes),
            (_, Format::Json) => text::convert_json(&resolved.bytes),
            (_, Format::Html) => text::convert_html(&resolved.bytes),
            (_, other) => {
                return Err(ConvertError::UnsupportedFormat {
                    detail: unsupported_detail(other, &self.config.backend),
                });
            }
        };

        info!(
            "Converted {} → {} bytes of markdown",
            resolved.filename.as_deref().unwrap_or(source),
            result.markdown.len()
        );
        Ok(result)
    }
}

fn unsupported_detail(format: &Format, backend: &BackendConfig) -> String {
    let name = match format {
        Format::Unknown(desc) => desc.clone(),
        other => format!("{other:?}").to_lowercase(),
    };
    match backend {
        BackendConfig::AzureOcr { .. } => format!("{name} is not supported"),
        _ => format!("{name} requires the Azure Document Intelligence backend"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp
    }

    fn engine() -> MarkItDown {
        MarkItDown::new(ConverterConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn markdown_file_passes_through() {
        let tmp = temp_file(".md", b"# Notes\n\nbody\n");
        let r = engine()
            .convert(tmp.path().to_str().unwrap(), None, false)
            .await
            .unwrap();
        assert_eq!(r.title.as_deref(), Some("Notes"));
        assert_eq!(r.markdown, "# Notes\n\nbody\n");
        assert_eq!(r.text_content, r.markdown);
    }

    #[tokio::test]
    async fn caller_hint_overrides_file_extension() {
        let tmp = temp_file(".txt", b"<html><head><title>T</title></head><p>x</p></html>");
        let hint = StreamInfo {
            extension: Some(".html".into()),
            mime_type: None,
        };
        let r = engine()
            .convert(tmp.path().to_str().unwrap(), Some(&hint), false)
            .await
            .unwrap();
        assert_eq!(r.title.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn image_without_llm_is_empty_unless_data_uris_kept() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let tmp = temp_file(".jpg", &jpeg);
        let path = tmp.path().to_str().unwrap();

        let plain = engine().convert(path, None, false).await.unwrap();
        assert_eq!(plain.markdown, "");

        let inlined = engine().convert(path, None, true).await.unwrap();
        assert!(
            inlined.markdown.starts_with("![image](data:image/jpeg;base64,"),
            "got: {}",
            inlined.markdown
        );
    }

    #[tokio::test]
    async fn pdf_without_azure_is_unsupported() {
        let tmp = temp_file(".pdf", b"%PDF-1.7\n");
        let err = engine()
            .convert(tmp.path().to_str().unwrap(), None, false)
            .await
            .unwrap_err();
        match err {
            ConvertError::UnsupportedFormat { detail } => {
                assert!(detail.contains("pdf"), "got: {detail}");
                assert!(detail.contains("Azure"), "got: {detail}");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    /// Serve one response with the given `Content-Type`, return its URL.
    async fn serve_once(content_type: &'static str, body: &'static [u8]) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).await.unwrap();
            stream.write_all(body).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{addr}/download")
    }

    #[tokio::test]
    async fn caller_extension_beats_server_content_type() {
        let url = serve_once("text/plain", b"%PDF-1.7\nbinary").await;
        let hint = StreamInfo {
            extension: Some(".pdf".into()),
            mime_type: None,
        };
        let err = engine().convert(&url, Some(&hint), false).await.unwrap_err();
        match err {
            ConvertError::UnsupportedFormat { detail } => {
                assert!(detail.contains("pdf"), "got: {detail}")
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_content_type_used_without_caller_hint() {
        let url = serve_once("text/html; charset=utf-8", b"<title>Served</title><p>x</p>").await;
        let r = engine().convert(&url, None, false).await.unwrap();
        assert_eq!(r.title.as_deref(), Some("Served"));
    }

    #[tokio::test]
    async fn docx_without_hints_is_unsupported_on_default_backend() {
        let mut docx = vec![b'P', b'K', 0x03, 0x04];
        docx.extend_from_slice(&[0u8; 26]);
        docx.extend_from_slice(b"word/document.xml");
        docx.extend_from_slice(&[0u8; 64]);
        let tmp = temp_file("", &docx);
        let err = engine()
            .convert(tmp.path().to_str().unwrap(), None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("docx"), "got: {err}");
    }

    #[test]
    fn factory_rejects_invalid_config() {
        let cfg = ConverterConfig {
            ocr_max_polls: 0,
            ..ConverterConfig::default()
        };
        assert!(MarkItDownFactory.build(&cfg).is_err());
    }

    #[test]
    fn factory_builds_llm_engine() {
        let cfg = ConverterConfig {
            backend: BackendConfig::LlmBacked {
                base_url: "https://api.example.com/v1".into(),
                api_key: "sk".into(),
                model: "gpt-4o-mini".into(),
            },
            ..ConverterConfig::default()
        };
        assert!(MarkItDownFactory.build(&cfg).is_ok());
    }
}
