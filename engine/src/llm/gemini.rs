//! Gemini LLM Provider
//!
//! Calls `models/{model}:generateContent` on the Google Generative Language
//! API. The API key travels in the `x-goog-api-key` header so it never shows
//! up in request URLs or in reqwest error messages.

use super::{LLMError, LLMProvider, Message, MessageRole};
use crate::config::GeminiConfig;
use crate::secrets::{scrub_secrets, SecretString};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub struct GeminiProvider {
    config: GeminiConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider whose requests give up after `config.timeout_secs`
    pub fn new(config: GeminiConfig, api_key: SecretString) -> Result<Self, LLMError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::ProviderUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the generateContent request body
    fn build_payload(messages: &[Message]) -> serde_json::Value {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for msg in messages {
            if msg.role == MessageRole::System {
                system_instruction = Some(json!({
                    "parts": [{"text": msg.content}]
                }));
                continue;
            }

            contents.push(json!({
                "role": if msg.role == MessageRole::Assistant { "model" } else { "user" },
                "parts": [{"text": msg.content}]
            }));
        }

        let mut payload = serde_json::Map::new();
        payload.insert("contents".to_string(), json!(contents));

        if let Some(sys) = system_instruction {
            payload.insert("systemInstruction".to_string(), sys);
        }

        serde_json::Value::Object(payload)
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(data: &serde_json::Value) -> Result<String, LLMError> {
        let candidate = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| LLMError::ParseError("No parts in candidate content".to_string()))?;

        let mut full_text = String::new();
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                full_text.push_str(text);
            }
        }

        Ok(full_text)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, messages: &[Message]) -> super::Result<String> {
        let payload = Self::build_payload(messages);

        tracing::debug!(
            "Gemini request: model={}, messages={}",
            self.config.model,
            messages.len()
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(scrub_secrets(&e.to_string()))
                }
            })?;

        tracing::debug!(
            "Gemini response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LLMError::Timeout
            } else {
                LLMError::ParseError(e.to_string())
            }
        })?;

        Self::extract_text(&data)
    }
}
