//! Image captioning through an OpenAI-compatible chat-completions endpoint.
//!
//! The request contains a single user message with two parts:
//! 1. the caption prompt as text
//! 2. the image as a base64 `data:` URI
//!
//! One request per image, no retries. Any non-success response fails the
//! conversion.

use crate::error::ConvertError;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Client for `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl LlmClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model to caption one image.
    pub async fn caption(&self, prompt: &str, data_uri: &str) -> Result<String, ConvertError> {
        let url = completions_url(&self.base_url);
        let body = build_request(&self.model, prompt, data_uri);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ConvertError::LlmApiError {
                message: format!("request to {url} failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::AuthError {
                service: "openai".into(),
                detail: format!("HTTP {status}: {}", truncate(&detail, 200)),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ConvertError::LlmApiError {
                message: format!("HTTP {status}: {}", truncate(&detail, 200)),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ConvertError::LlmApiError {
            message: format!("malformed response: {e}"),
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Caption: {} input tokens, {} output tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ConvertError::LlmApiError {
                message: "response contained no choices".into(),
            })
    }
}

/// `{base_url}/chat/completions`, tolerating a trailing slash.
fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn build_request(model: &str, prompt: &str, data_uri: &str) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": data_uri } }
            ]
        }]
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
