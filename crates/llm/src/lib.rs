//! Language-model integration for nucrag.
//!
//! A provider-agnostic `LlmClient` trait with one implementation per backend
//! family, the catalog of selectable backends, and the timeout/retry policy
//! shared by every HTTP call in the workspace (embedding clients included).
//!
//! # Backends
//! - **Azure OpenAI**: the `AzureGPT` chat deployment
//! - **OpenAI**: `gpt-4o`, `gpt-4o-mini`, `gpt-3.5-turbo` and friends
//! - **Ollama**: local runtime, model taken from config
//!
//! # Example
//! ```no_run
//! use nucrag_core::AppConfig;
//! use nucrag_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let client = create_client("ollama", &config)?;
//! let request = LlmRequest::new("llama3.2", "Answer briefly.", "What is a scram?");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod factory;
pub mod http;
pub mod providers;
pub mod retry;

// Re-export main types
pub use catalog::{BackendSpec, ProviderType, BACKENDS};
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, Sampling};
pub use factory::{create_client, resolve_model};
pub use providers::{AzureOpenAiClient, OllamaClient, OpenAiClient};
pub use retry::RetryPolicy;
