//! Gemini client
//!
//! Calls the Generative Language REST API `generateContent` endpoint.
//! One request per call, no retries.

use std::time::Duration;

use async_trait::async_trait;
use dataroom_core::AppConfig;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{LlmClient, LlmError};

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            Duration::from_secs(config.llm_timeout_seconds),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generate: called");

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: parse_error_message(&text),
            });
        }

        let answer = parse_generate_content(&text)?;
        debug!(response_len = answer.len(), "generate: completed");
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extract the text of the first candidate from a `generateContent` body
pub fn parse_generate_content(body: &str) -> Result<String, LlmError> {
    let raw: Value = serde_json::from_str(body)?;

    if let Some(reason) = raw["promptFeedback"]["blockReason"].as_str() {
        return Err(LlmError::InvalidResponse(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let parts = raw["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| LlmError::InvalidResponse("response has no candidates".to_string()))?;

    let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();
    if text.is_empty() {
        return Err(LlmError::InvalidResponse(
            "candidate contains no text".to_string(),
        ));
    }

    Ok(text)
}

/// Best human-readable message from an error body
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|raw| raw["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_content() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Total sales "}, {"text": "are 35."}]
                },
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(parse_generate_content(body).unwrap(), "Total sales are 35.");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = parse_generate_content(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_missing_candidates() {
        assert!(matches!(
            parse_generate_content(r#"{"candidates": []}"#),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_generate_content("not json"),
            Err(LlmError::Json(_))
        ));
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(parse_error_message(body), "API key not valid");
        assert_eq!(parse_error_message("  upstream timeout \n"), "upstream timeout");
    }

    #[test]
    fn test_new_requires_key() {
        let result = GeminiClient::new("  ", "gemini-pro", "http://localhost", Duration::from_secs(1));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(
            "key",
            "gemini-pro",
            "https://generativelanguage.googleapis.com/v1beta/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-pro");
    }
}
