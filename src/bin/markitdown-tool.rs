//! CLI binary for markitdown-tool.
//!
//! A local stand-in for the plugin host: it collects credentials from flags
//! or environment variables, then calls the same provider and tool hooks the
//! host would call.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use markitdown_tool::credentials::{
    AZURE_API_KEY, AZURE_DOCINTEL_API_VERSION, AZURE_DOCINTEL_CREDENTIAL, AZURE_DOCINTEL_ENDPOINT,
    OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL,
};
use markitdown_tool::{
    select_backend, Credentials, FileRef, MarkitdownProvider, MarkitdownTool, Tool,
    ToolInvokeMessage, ToolParameters, ToolProvider,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Validate OpenAI-compatible credentials
  markitdown-tool validate --openai-base-url https://api.openai.com/v1 \
      --openai-api-key sk-... --openai-model gpt-4o-mini

  # Convert a local markdown or HTML file (no credentials needed)
  markitdown-tool convert ./notes.html

  # Convert a PDF through Azure Document Intelligence
  markitdown-tool convert https://example.com/report.pdf \
      --azure-document-intelligence-endpoint https://my-di.cognitiveservices.azure.com/ \
      --azure-document-intelligence-credential <KEY>

  # Emit both tool messages as JSON
  markitdown-tool convert ./photo.jpg --keep-data-uris --json

  # Show the tool manifest a host would register
  markitdown-tool describe

BACKENDS (first match wins):
  Azure OCR   --azure-document-intelligence-endpoint is set
  LLM         --openai-base-url, --openai-api-key and --openai-model are all set
  Default     otherwise; text, markdown, JSON and HTML only

ENVIRONMENT VARIABLES:
  AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT     Document Intelligence endpoint
  AZURE_DOCUMENT_INTELLIGENCE_CREDENTIAL   Document Intelligence key
  AZURE_DOCUMENT_INTELLIGENCE_API_VERSION  API version (default 2024-07-31-preview)
  AZURE_API_KEY                            Fallback Azure key
  OPENAI_API_KEY                           OpenAI-compatible API key
  OPENAI_BASE_URL                          OpenAI-compatible base URL
  OPENAI_MODEL                             Caption model
  EXPOSE_PLUGIN_DEBUGGING_HOST             Host used for relative file URLs
"#;

/// Convert documents to Markdown the way the plugin tool does.
#[derive(Parser, Debug)]
#[command(
    name = "markitdown-tool",
    version,
    about = "Validate markitdown credentials and convert documents to Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MARKITDOWN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MARKITDOWN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the credential check (one trial conversion of a sample image).
    Validate {
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Convert a file URL or local path and print the tool output.
    Convert(ConvertArgs),
    /// Print the tool's name, description and parameter schema as JSON.
    Describe,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// HTTP/HTTPS URL, path relative to the debug host, or local file.
    input: String,

    /// Extension hint (e.g. pdf, .docx).
    #[arg(long)]
    extension: Option<String>,

    /// MIME type hint (e.g. application/pdf).
    #[arg(long)]
    mime_type: Option<String>,

    /// Inline embedded images as base64 data URIs.
    #[arg(long)]
    keep_data_uris: bool,

    /// Print both tool messages as a JSON array instead of raw markdown.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    credentials: CredentialArgs,
}

#[derive(Args, Debug, Default)]
struct CredentialArgs {
    /// Azure Document Intelligence endpoint.
    #[arg(long, env = "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT")]
    azure_document_intelligence_endpoint: Option<String>,

    /// Azure Document Intelligence key.
    #[arg(long, env = "AZURE_DOCUMENT_INTELLIGENCE_CREDENTIAL", hide_env_values = true)]
    azure_document_intelligence_credential: Option<String>,

    /// Azure Document Intelligence API version.
    #[arg(long, env = "AZURE_DOCUMENT_INTELLIGENCE_API_VERSION")]
    azure_document_intelligence_api_version: Option<String>,

    /// Azure key used when no Document Intelligence key is given.
    #[arg(long, env = "AZURE_API_KEY", hide_env_values = true)]
    azure_api_key: Option<String>,

    /// OpenAI-compatible API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// OpenAI-compatible base URL.
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Model used for image captions.
    #[arg(long, env = "OPENAI_MODEL")]
    openai_model: Option<String>,
}

impl CredentialArgs {
    fn to_credentials(&self) -> Credentials {
        [
            (AZURE_DOCINTEL_ENDPOINT, &self.azure_document_intelligence_endpoint),
            (AZURE_DOCINTEL_CREDENTIAL, &self.azure_document_intelligence_credential),
            (AZURE_DOCINTEL_API_VERSION, &self.azure_document_intelligence_api_version),
            (AZURE_API_KEY, &self.azure_api_key),
            (OPENAI_API_KEY, &self.openai_api_key),
            (OPENAI_BASE_URL, &self.openai_base_url),
            (OPENAI_MODEL, &self.openai_model),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k, v.clone())))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Validate { credentials } => {
            let credentials = credentials.to_credentials();
            let backend = select_backend(&credentials, false).backend;
            if let Err(e) = MarkitdownProvider::new()
                .validate_credentials(&credentials)
                .await
            {
                eprintln!("{} credentials rejected ({})", red("✘"), backend.kind());
                return Err(e).context("Credential validation failed");
            }
            if !cli.quiet {
                eprintln!(
                    "{} credentials valid {}",
                    green("✔"),
                    dim(&format!("(backend: {})", backend.kind()))
                );
            }
        }
        Command::Convert(args) => run_convert(args, cli.quiet).await?,
        Command::Describe => {
            let tool = MarkitdownTool::new(Credentials::new());
            let manifest = serde_json::json!({
                "name": tool.name(),
                "description": tool.description(),
                "parameters": tool.parameters(),
            });
            let json = serde_json::to_string_pretty(&manifest)
                .context("Failed to serialise tool description")?;
            println!("{json}");
        }
    }

    Ok(())
}

async fn run_convert(args: ConvertArgs, quiet: bool) -> Result<()> {
    let mut file = FileRef::new(&args.input);
    file.extension = args.extension.clone();
    file.mime_type = args.mime_type.clone();

    let tool = MarkitdownTool::new(args.credentials.to_credentials());
    let params = ToolParameters {
        file: Some(file),
        keep_data_uris: args.keep_data_uris,
    };

    let messages = tool.invoke(params).await.context("Conversion failed")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let json =
            serde_json::to_string_pretty(&messages).context("Failed to serialise messages")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        for message in &messages {
            if let ToolInvokeMessage::Text { text } = message {
                handle
                    .write_all(text.as_bytes())
                    .context("Failed to write to stdout")?;
                if !text.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
        }
    }

    if !quiet && !args.json {
        if let Some(ToolInvokeMessage::Json { json }) = messages.get(1) {
            let title = json["title"].as_str().unwrap_or("(untitled)");
            eprintln!("{} {}", green("✔"), dim(&format!("title: {title}")));
        }
    }

    Ok(())
}
