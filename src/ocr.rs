//! Text recognition for shelf photos.
//!
//! Defines the [`TextRecognizer`] trait and its implementations:
//! - **[`GoogleVisionRecognizer`]** — calls the Cloud Vision `images:annotate`
//!   REST endpoint with `TEXT_DETECTION`.
//! - **[`DisabledRecognizer`]** — always errors; used when `ocr.provider = "disabled"`.
//!
//! Use [`create_recognizer`] to pick one from configuration.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use std::time::Duration;

use crate::config::OcrConfig;

/// Turns image bytes into the raw text found in the image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Short provider identifier (e.g. `"google_vision"`).
    fn name(&self) -> &str;

    /// Recognize all text in an encoded image (JPEG, PNG, ...).
    ///
    /// Returns an empty string when the provider finds no text.
    async fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// Create the recognizer selected by `ocr.provider`.
pub fn create_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>> {
    match config.provider.as_str() {
        "google_vision" => Ok(Box::new(GoogleVisionRecognizer::new(config)?)),
        "disabled" => Ok(Box::new(DisabledRecognizer)),
        other => bail!("Unknown OCR provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// Recognizer used when OCR is switched off. Every call fails.
pub struct DisabledRecognizer;

#[async_trait]
impl TextRecognizer for DisabledRecognizer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn recognize(&self, _image: &[u8]) -> Result<String> {
        bail!("OCR provider is disabled")
    }
}

// ============ Google Vision Provider ============

/// Recognizer backed by Google Cloud Vision.
///
/// Requires the `GOOGLE_VISION_API_KEY` environment variable.
pub struct GoogleVisionRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleVisionRecognizer {
    /// # Errors
    ///
    /// Returns an error if `GOOGLE_VISION_API_KEY` is not in the environment.
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = std::env::var("GOOGLE_VISION_API_KEY")
            .map_err(|_| anyhow::anyhow!("GOOGLE_VISION_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    fn name(&self) -> &str {
        "google_vision"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let body = annotate_request(image);

        let response = self
            .client
            .post(format!("{}/v1/images:annotate", self.endpoint))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Vision request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Vision API error {}: {}", status, body_text);
        }

        let json: Value = response
            .json()
            .await
            .context("Invalid Vision response: body is not JSON")?;
        parse_annotate_response(&json)
    }
}

/// Build the `images:annotate` request body for one image.
fn annotate_request(image: &[u8]) -> Value {
    let content = base64::engine::general_purpose::STANDARD.encode(image);
    serde_json::json!({
        "requests": [{
            "image": { "content": content },
            "features": [{ "type": "TEXT_DETECTION" }]
        }]
    })
}

/// Extract the full detected text from an `images:annotate` response.
///
/// The first text annotation holds the whole block of text; the rest are
/// individual words and are ignored.
fn parse_annotate_response(json: &Value) -> Result<String> {
    let first = json
        .get("responses")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
        .ok_or_else(|| anyhow::anyhow!("Invalid Vision response: missing responses"))?;

    if let Some(message) = first
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        bail!("Vision API error: {}", message);
    }

    Ok(first
        .get("textAnnotations")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(|a| a.get("description"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}
