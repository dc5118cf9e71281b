//! The `LlmClient` capability and the request/response shapes every backend
//! speaks.

use nucrag_core::AppResult;
use serde::{Deserialize, Serialize};

/// Sampling settings sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 2000,
        }
    }
}

/// One cited-answer completion: a system instruction and a user prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Sent as-is; Azure ignores it in favour of the deployment in the URL
    pub model: String,
    /// Empty when the backend should run without a system message
    pub system: String,
    pub prompt: String,
    pub sampling: Sampling,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            prompt: prompt.into(),
            sampling: Sampling::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// The system message, if there is one.
    pub fn system_message(&self) -> Option<&str> {
        Some(self.system.as_str()).filter(|s| !s.trim().is_empty())
    }
}

/// What a backend sent back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    /// Model reported by the backend, or the requested one
    pub model: String,
    pub usage: LlmUsage,
}

/// Token accounting, zero when the backend does not report it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn from_counts(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A language-model backend.
///
/// Implementations resolve endpoint and credentials when they are built and
/// run each call through the shared `RetryPolicy`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider label used in logs ("azure", "openai", "ollama").
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
