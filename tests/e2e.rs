//! End-to-end tests against live backends.
//!
//! These make real network calls (OpenAI-compatible chat completions, Azure
//! Document Intelligence, public file URLs). They are gated behind the
//! `E2E_ENABLED` environment variable and skip individually when the
//! credentials they need are missing.
//!
//! Run with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=... OPENAI_BASE_URL=... OPENAI_MODEL=... \
//!     cargo test --test e2e -- --nocapture
//!
//! Azure tests additionally need AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT and
//! AZURE_DOCUMENT_INTELLIGENCE_CREDENTIAL.

use markitdown_tool::credentials::{
    AZURE_DOCINTEL_CREDENTIAL, AZURE_DOCINTEL_ENDPOINT, OPENAI_API_KEY, OPENAI_BASE_URL,
    OPENAI_MODEL,
};
use markitdown_tool::{
    Credentials, FileRef, MarkitdownProvider, MarkitdownTool, Tool, ToolError,
    ToolInvokeMessage, ToolParameters, ToolProvider,
};

const SAMPLE_PDF_URL: &str =
    "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf";
const SAMPLE_HTML_URL: &str = "https://example.com/";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Credentials for the listed keys, read from the environment.
/// `None` when any of them is unset.
fn env_credentials(keys: &[&str]) -> Option<Credentials> {
    let mut creds = Credentials::new();
    for key in keys {
        let value = std::env::var(key.to_uppercase()).ok()?;
        creds.insert(*key, value);
    }
    Some(creds)
}

/// Skip unless E2E_ENABLED is set and every listed credential is available.
macro_rules! e2e_skip_unless_ready {
    ($($key:expr),* $(,)?) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        init_tracing();
        let keys: &[&str] = &[$($key),*];
        match env_credentials(keys) {
            Some(creds) => creds,
            None => {
                println!("SKIP: missing credentials {:?}", keys);
                return;
            }
        }
    }};
}

/// Route library logs to the test output. Level follows `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("markitdown_tool=debug")),
        )
        .with_test_writer()
        .try_init();
}

fn markdown_of(messages: &[ToolInvokeMessage]) -> &str {
    assert_eq!(messages.len(), 2, "tool must emit exactly two messages");
    match &messages[0] {
        ToolInvokeMessage::Text { text } => text,
        other => panic!("first message must be text, got {other:?}"),
    }
}

// ── Default backend (network, no keys) ───────────────────────────────────────

#[tokio::test]
async fn test_default_backend_converts_public_html() {
    let creds = e2e_skip_unless_ready!();

    let messages = MarkitdownTool::new(creds)
        .invoke(ToolParameters::for_file(FileRef::new(SAMPLE_HTML_URL)))
        .await
        .expect("html conversion should succeed");

    let md = markdown_of(&messages);
    assert!(md.contains("Example Domain"), "got: {md}");
    println!("--- BEGIN OUTPUT ---\n{md}\n--- END OUTPUT ---");
}

#[tokio::test]
async fn test_default_backend_rejects_pdf() {
    let creds = e2e_skip_unless_ready!();

    let err = MarkitdownTool::new(creds)
        .invoke(ToolParameters::for_file(FileRef::new(SAMPLE_PDF_URL)))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::ConversionFailed { .. }), "got: {err:?}");
}

// ── LLM backend ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_llm_credentials_validate() {
    let creds = e2e_skip_unless_ready!(OPENAI_BASE_URL, OPENAI_API_KEY, OPENAI_MODEL);

    MarkitdownProvider::new()
        .validate_credentials(&creds)
        .await
        .expect("live LLM credentials should validate");
}

#[tokio::test]
async fn test_llm_bad_key_is_rejected() {
    let creds = e2e_skip_unless_ready!(OPENAI_BASE_URL, OPENAI_MODEL);
    let creds = creds.with(OPENAI_API_KEY, "sk-definitely-not-valid");

    let err = MarkitdownProvider::new()
        .validate_credentials(&creds)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidCredentials { .. }), "got: {err:?}");
    println!("Rejected as expected: {err}");
}

// ── Azure Document Intelligence backend ──────────────────────────────────────

#[tokio::test]
async fn test_azure_credentials_validate() {
    let creds = e2e_skip_unless_ready!(AZURE_DOCINTEL_ENDPOINT, AZURE_DOCINTEL_CREDENTIAL);

    MarkitdownProvider::new()
        .validate_credentials(&creds)
        .await
        .expect("live Azure credentials should validate");
}

#[tokio::test]
async fn test_azure_converts_pdf() {
    let creds = e2e_skip_unless_ready!(AZURE_DOCINTEL_ENDPOINT, AZURE_DOCINTEL_CREDENTIAL);

    let file = FileRef::new(SAMPLE_PDF_URL)
        .with_extension("pdf")
        .with_mime_type("application/pdf");
    let messages = MarkitdownTool::new(creds)
        .invoke(ToolParameters::for_file(file))
        .await
        .expect("pdf conversion should succeed");

    let md = markdown_of(&messages);
    assert!(!md.trim().is_empty(), "markdown is empty");
    assert!(md.to_lowercase().contains("dummy"), "got: {md}");
    println!("--- BEGIN OUTPUT ---\n{md}\n--- END OUTPUT ---");
}
