//! LLM client layer
//!
//! Provider-agnostic interface used by the Planner and Executor. The Gemini
//! client talks to the hosted API; the scripted client replays canned
//! responses for tests and offline runs.

use async_trait::async_trait;

mod error;
pub mod gemini;
pub mod scripted;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use scripted::ScriptedClient;

/// A text-in, text-out language model
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}
