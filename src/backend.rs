//! Backend selection: which augmentation the engine uses for a call.
//!
//! The credential validator and the conversion tool both read the same
//! credential keys and must agree on the outcome, so the decision lives in
//! one pure function, [`select_backend`].
//!
//! Priority, strictly in this order:
//!
//! 1. **Azure OCR**: a Document Intelligence endpoint is configured.
//! 2. **LLM-backed**: base URL, API key and model are all configured.
//! 3. **Default**: no external augmentation.

use crate::config::ConverterConfig;
use crate::credentials::{
    Credentials, AZURE_API_KEY, AZURE_DOCINTEL_API_VERSION, AZURE_DOCINTEL_CREDENTIAL,
    AZURE_DOCINTEL_ENDPOINT, OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL,
};
use std::fmt;

/// The augmentation strategy handed to the conversion engine.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum BackendConfig {
    /// Built-in converters only.
    #[default]
    Default,
    /// Images are captioned by an OpenAI-compatible chat-completions endpoint.
    LlmBacked {
        base_url: String,
        api_key: String,
        model: String,
    },
    /// Documents and images are analysed by Azure Document Intelligence.
    AzureOcr {
        endpoint: String,
        /// Subscription key. Taken from the Document Intelligence credential,
        /// or from `azure_api_key` when that is the only key supplied.
        credential: Option<String>,
        api_version: Option<String>,
    },
}

impl BackendConfig {
    /// Short name for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Default => "default",
            BackendConfig::LlmBacked { .. } => "llm",
            BackendConfig::AzureOcr { .. } => "azure-docintel",
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendConfig::Default => f.write_str("Default"),
            BackendConfig::LlmBacked {
                base_url, model, ..
            } => f
                .debug_struct("LlmBacked")
                .field("base_url", base_url)
                .field("api_key", &"<redacted>")
                .field("model", model)
                .finish(),
            BackendConfig::AzureOcr {
                endpoint,
                credential,
                api_version,
            } => f
                .debug_struct("AzureOcr")
                .field("endpoint", endpoint)
                .field("credential", &credential.as_ref().map(|_| "<redacted>"))
                .field("api_version", api_version)
                .finish(),
        }
    }
}

/// Pick the backend for `credentials` and wrap it in a [`ConverterConfig`]
/// carrying `keep_data_uris`. All other settings keep their defaults.
pub fn select_backend(credentials: &Credentials, keep_data_uris: bool) -> ConverterConfig {
    ConverterConfig {
        backend: backend_from_credentials(credentials),
        keep_data_uris,
        ..ConverterConfig::default()
    }
}

fn backend_from_credentials(credentials: &Credentials) -> BackendConfig {
    if let Some(endpoint) = credentials.get(AZURE_DOCINTEL_ENDPOINT) {
        let credential = credentials
            .get(AZURE_DOCINTEL_CREDENTIAL)
            .or_else(|| credentials.get(AZURE_API_KEY))
            .map(str::to_string);
        return BackendConfig::AzureOcr {
            endpoint: endpoint.to_string(),
            credential,
            api_version: credentials
                .get(AZURE_DOCINTEL_API_VERSION)
                .map(str::to_string),
        };
    }

    if let (Some(base_url), Some(api_key), Some(model)) = (
        credentials.get(OPENAI_BASE_URL),
        credentials.get(OPENAI_API_KEY),
        credentials.get(OPENAI_MODEL),
    ) {
        return BackendConfig::LlmBacked {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        };
    }

    BackendConfig::Default
}
