//! Generation backend and prompt construction

mod backend;
mod ollama;
mod prompt;

pub use backend::{ChatBackend, GenerationParams};
pub use ollama::OllamaChat;
pub use prompt::PromptBuilder;
