//! LLM error types

use thiserror::Error;

/// Errors that can occur while calling the language model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Gemini API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the error comes from missing configuration rather than the call
    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::MissingApiKey)
    }
}
