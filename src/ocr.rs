//! OCR service client.
//!
//! The service is treated as an external collaborator: `OcrEngine` hides it
//! behind a trait so the batch pipeline can run against a mock in tests.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::StatusCode;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::error::{ErrorContext, HopeError, HopeResult};

/// Turns one image into "label: value" text
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image_path: &Path) -> HopeResult<String>;
}

/// Bounded retry for rate-limited requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Attempt `n` (0-based) waits `backoff * (n + 1)` after a 429
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * (attempt + 1)
    }
}

/// Outcome of a single OCR attempt
#[derive(Debug)]
pub enum AttemptError {
    /// The service answered 429; worth retrying
    RateLimited,
    /// Anything else; surfaced immediately
    Fatal(HopeError),
}

/// Run `op` until it succeeds, fails hard, or the policy is exhausted
pub async fn retry_on_rate_limit<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> HopeResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    for attempt in 0..policy.max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::RateLimited) => {
                let wait = policy.delay_for(attempt);
                warn!(attempt = attempt + 1, wait_secs = wait.as_secs_f64(), "429 Too Many Requests, retrying");
                tokio::time::sleep(wait).await;
            }
            Err(AttemptError::Fatal(e)) => return Err(e),
        }
    }
    Err(HopeError::RateLimited {
        attempts: policy.max_attempts,
    })
}

/// Mistral OCR HTTP client
pub struct MistralOcr {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
    request_delay: Duration,
}

impl MistralOcr {
    pub fn new(config: &OcrConfig) -> HopeResult<Self> {
        let api_key = config.api_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HopeError::ocr_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                backoff: config.backoff(),
            },
            request_delay: config.request_delay(),
        })
    }

    async fn request_once(&self, body: &serde_json::Value) -> Result<serde_json::Value, AttemptError> {
        let resp = self
            .client
            .post(format!("{}/v1/ocr", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Fatal(HopeError::ocr_with_source("request failed", e)))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AttemptError::Fatal(HopeError::ocr(format!(
                "OCR service returned {}: {}",
                status, text
            ))));
        }

        resp.json()
            .await
            .map_err(|e| AttemptError::Fatal(HopeError::ocr_with_source("malformed OCR response", e)))
    }
}

#[async_trait]
impl OcrEngine for MistralOcr {
    async fn extract_text(&self, image_path: &Path) -> HopeResult<String> {
        let bytes = tokio::fs::read(image_path).await.with_path(image_path)?;
        let data_url = format!("data:{};base64,{}", mime_type(image_path), STANDARD.encode(&bytes));
        let body = serde_json::json!({
            "model": self.model,
            "document": {
                "type": "image_url",
                "image_url": data_url,
            },
            "include_image_base64": false,
        });

        info!(file = %image_path.display(), bytes = bytes.len(), "Sending image to OCR");
        let body = &body;
        let response = retry_on_rate_limit(&self.retry, move |_| self.request_once(body)).await?;
        tokio::time::sleep(self.request_delay).await;

        let text = flatten_ocr_response(&response);
        debug!(file = %image_path.display(), chars = text.chars().count(), "OCR text received");
        Ok(text)
    }
}

/// Flatten an OCR response into "label: value" lines.
///
/// Prefers a top-level `text`; otherwise reads two-cell rows from the first
/// page's markdown table. Anything else yields "".
pub fn flatten_ocr_response(response: &serde_json::Value) -> String {
    if let Some(text) = response.get("text").and_then(|t| t.as_str()) {
        if !text.is_empty() {
            return text.to_string();
        }
    }

    response
        .get("pages")
        .and_then(|pages| pages.get(0))
        .and_then(|page| page.get("markdown"))
        .and_then(|md| md.as_str())
        .map(flatten_markdown_table)
        .unwrap_or_default()
}

/// Convert `| key | value |` rows to `key: value` lines
pub fn flatten_markdown_table(markdown: &str) -> String {
    let lines: Vec<String> = markdown
        .lines()
        .filter(|line| line.starts_with('|') && line.matches('|').count() >= 3)
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split('|').collect();
            let inner = &parts[1..parts.len() - 1];
            match inner {
                [key, value] => Some(format!("{}: {}", key.trim(), value.trim())),
                _ => None,
            }
        })
        .collect();

    lines.join("\n").trim().to_string()
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "image/jpeg",
    }
}
