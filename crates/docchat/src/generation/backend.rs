//! Generation backend trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChatMessage;

/// Sampling parameters for one completion call
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    /// Maximum tokens in the answer
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling parameter
    pub top_p: f32,
}

/// Trait for LLM-backed chat completion
///
/// Implementations:
/// - `OllamaChat`: local Ollama server
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a completion for an ordered message sequence
    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams)
        -> Result<String>;

    /// Check if the backend is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
