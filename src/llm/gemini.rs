//! Google Gemini client
//!
//! Talks to the Generative Language REST API (`models/{model}:generateContent`)
//! with the API key passed as a query parameter. Gemini is driven as a
//! single-prompt model: system instructions and the user prompt are joined
//! into one user turn.

use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request_body(prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        })
    }

    /// Concatenate the text parts of the first candidate.
    fn parse_response(body: &Value) -> Result<String> {
        let candidate = body["candidates"]
            .as_array()
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| AppError::LLM("No candidates in Gemini response".to_string()))?;

        let parts = candidate["content"]["parts"].as_array().ok_or_else(|| {
            let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
            AppError::LLM(format!(
                "Gemini candidate has no content (finish reason: {})",
                reason
            ))
        })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(text)
    }

    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> AppError {
        match status.as_u16() {
            401 | 403 => AppError::Configuration(format!(
                "Gemini rejected the configured API key (HTTP {})",
                status
            )),
            _ => AppError::LLM(format!("HTTP {} from Gemini API: {}", status, body_text)),
        }
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint_url();

        debug!(model = self.model.as_str(), "Sending Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_request_body(prompt))
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Request to Gemini API failed: {}", e)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| AppError::LLM(format!("Failed to read Gemini response body: {}", e)))?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let body: Value = serde_json::from_str(&body_text)
            .map_err(|e| AppError::LLM(format!("Invalid JSON in Gemini response: {}", e)))?;

        Self::parse_response(&body)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate(&format!("{}\n\n{}", system, prompt)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
