//! Gemini REST client for email-body generation.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::error::GenerationError;
use crate::llm::TextGenerator;

/// Generation endpoint configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Build config from environment variables.
    /// Returns `None` if `GEMINI_API_KEY` is not set (generation disabled;
    /// the composer falls back to the static template).
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;

        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());

        let request_timeout_secs: u64 = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20);

        Some(Self {
            api_key: SecretString::from(api_key),
            model,
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// `TextGenerator` backed by the generative-language REST API.
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text = extract_completion(&payload)
            .ok_or_else(|| GenerationError::InvalidResponse("no candidate text".to_string()))?;
        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self.generate_once(prompt).await {
            Err(GenerationError::Status(503)) => {
                tracing::warn!("Generation endpoint overloaded, retrying in 2s");
                tokio::time::sleep(Duration::from_secs(2)).await;
                self.generate_once(prompt).await
            }
            other => other,
        }
    }
}

/// Pull the concatenated candidate text out of a generateContent response.
fn extract_completion(payload: &serde_json::Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}
