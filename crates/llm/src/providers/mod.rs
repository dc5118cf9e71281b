//! Completion backend implementations.

mod azure;
mod ollama;
mod openai;

pub use azure::AzureOpenAiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
