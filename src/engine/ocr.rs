//! Azure Document Intelligence (`prebuilt-layout`, markdown output).
//!
//! Analysis is a long-running operation: the submit call answers `202` with
//! an `Operation-Location` header, which is polled until the operation
//! reaches a terminal status. The poll count is bounded by
//! [`crate::config::ConverterConfig::ocr_max_polls`].

use crate::config::DEFAULT_DOCINTEL_API_VERSION;
use crate::error::ConvertError;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const SERVICE: &str = "azure-docintel";

/// Client for one Document Intelligence resource.
#[derive(Clone)]
pub struct AzureDocIntel {
    http: reqwest::Client,
    endpoint: String,
    credential: Option<String>,
    api_version: String,
    timeout: Duration,
    poll_interval: Duration,
    max_polls: u32,
}

impl std::fmt::Debug for AzureDocIntel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDocIntel")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("has_credential", &self.credential.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl AzureDocIntel {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        credential: Option<String>,
        api_version: Option<String>,
        timeout_secs: u64,
        poll_interval_ms: u64,
        max_polls: u32,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            credential,
            api_version: api_version.unwrap_or_else(|| DEFAULT_DOCINTEL_API_VERSION.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_polls,
        }
    }

    /// Analyse `bytes` and return the service's markdown.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<String, ConvertError> {
        let url = analyze_url(&self.endpoint, &self.api_version);
        info!("Submitting {} bytes to Document Intelligence", bytes.len());

        let response = self
            .authorized(self.http.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ocr_failed(format!("submit to {url} failed: {e}")))?;

        let status = response.status();
        check_auth(status)?;
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ocr_failed(format!("submit returned HTTP {status}: {detail}")));
        }

        let operation = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ocr_failed("response had no Operation-Location header"))?;

        self.poll(&operation).await
    }

    async fn poll(&self, operation: &str) -> Result<String, ConvertError> {
        for attempt in 1..=self.max_polls {
            sleep(self.poll_interval).await;

            let response = self
                .authorized(self.http.get(operation))
                .send()
                .await
                .map_err(|e| ocr_failed(format!("poll failed: {e}")))?;
            check_auth(response.status())?;
            if !response.status().is_success() {
                return Err(ocr_failed(format!("poll returned HTTP {}", response.status())));
            }

            let op: OperationStatus = response
                .json()
                .await
                .map_err(|e| ocr_failed(format!("malformed operation status: {e}")))?;
            debug!("Document Intelligence poll {}: {}", attempt, op.status);

            if let Some(markdown) = interpret(op)? {
                return Ok(markdown);
            }
        }
        Err(ocr_failed(format!(
            "analysis did not finish after {} polls",
            self.max_polls
        )))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.timeout(self.timeout);
        match &self.credential {
            Some(key) => req.header(SUBSCRIPTION_KEY_HEADER, key),
            None => req,
        }
    }
}

fn analyze_url(endpoint: &str, api_version: &str) -> String {
    format!(
        "{}/documentintelligence/documentModels/prebuilt-layout:analyze\
         ?_overload=analyzeDocument&api-version={}&outputContentFormat=markdown",
        endpoint.trim_end_matches('/'),
        api_version
    )
}

/// `Ok(Some)` when done, `Ok(None)` while running, `Err` on failure.
fn interpret(op: OperationStatus) -> Result<Option<String>, ConvertError> {
    match op.status.to_ascii_lowercase().as_str() {
        "succeeded" => Ok(Some(
            op.analyze_result.map(|r| r.content).unwrap_or_default(),
        )),
        "failed" | "canceled" => {
            let detail = op
                .error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| format!("operation {}", op.status));
            Err(ocr_failed(detail))
        }
        _ => Ok(None),
    }
}

fn check_auth(status: reqwest::StatusCode) -> Result<(), ConvertError> {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ConvertError::AuthError {
            service: SERVICE.into(),
            detail: format!("HTTP {status}"),
        });
    }
    Ok(())
}

fn ocr_failed(detail: impl Into<String>) -> ConvertError {
    ConvertError::OcrFailed {
        detail: detail.into(),
    }
}
