//! # markitdown-tool
//!
//! Document-to-Markdown conversion exposed as a tool that a plugin host can
//! call.
//!
//! The crate implements the two hooks a host runtime invokes:
//!
//! * [`MarkitdownProvider`] ([`ToolProvider`]) validates a credential bundle
//!   by building a converter and converting a bundled sample image once.
//! * [`MarkitdownTool`] ([`Tool`]) takes a host file reference, normalizes
//!   its URL and format hints, converts it, and returns exactly two messages:
//!   the markdown text, then `{"title", "text_content"}` as JSON.
//!
//! ## Backends
//!
//! | Credentials present | Backend | Effect |
//! |---------------------|---------|--------|
//! | `azure_document_intelligence_endpoint` | Azure OCR | PDFs, office files and images analysed by Document Intelligence |
//! | `openai_base_url` + `openai_api_key` + `openai_model` | LLM | images captioned by an OpenAI-compatible model |
//! | neither | Default | text, markdown, JSON and HTML only |
//!
//! Azure takes precedence when both are configured. See [`select_backend`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markitdown_tool::{Credentials, FileRef, MarkitdownTool, Tool, ToolParameters};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool = MarkitdownTool::new(Credentials::new());
//!     let params = ToolParameters::for_file(FileRef::new("https://example.com/notes.md"));
//!     for message in tool.invoke(params).await? {
//!         println!("{}", serde_json::to_string(&message)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markitdown-tool` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod file;
pub mod hints;
pub mod net;
pub mod provider;
pub mod tool;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{select_backend, BackendConfig};
pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use credentials::Credentials;
pub use engine::{
    ConversionResult, ConverterFactory, DocumentConverter, MarkItDown, MarkItDownFactory,
};
pub use error::{ConvertError, ToolError};
pub use file::FileRef;
pub use hints::StreamInfo;
pub use net::{AddressDiscovery, FixedAddress, UdpProbe};
pub use provider::{MarkitdownProvider, ToolProvider};
pub use tool::{MarkitdownTool, Tool, ToolInvokeMessage, ToolParameters, ToolSettings};
