//! Catalog of selectable language-model backends.
//!
//! Backend names are what the user picks; each maps to a provider family and
//! token limits used to default and clamp `max_tokens`.

use nucrag_core::{AppError, AppResult};

/// Provider family behind a backend name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Azure,
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// A selectable completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSpec {
    /// Name shown to and chosen by the user
    pub name: &'static str,
    pub provider: ProviderType,
    /// Largest completion the backend accepts
    pub max_tokens: u32,
    /// Default completion size when none is requested
    pub recommended_max_tokens: u32,
}

const fn openai(name: &'static str, max_tokens: u32, recommended_max_tokens: u32) -> BackendSpec {
    BackendSpec {
        name,
        provider: ProviderType::OpenAI,
        max_tokens,
        recommended_max_tokens,
    }
}

/// Every known backend, default first.
pub const BACKENDS: &[BackendSpec] = &[
    BackendSpec {
        name: "AzureGPT",
        provider: ProviderType::Azure,
        max_tokens: 4096,
        recommended_max_tokens: 2000,
    },
    openai("gpt-4o", 8192, 4000),
    openai("gpt-4o-mini", 4096, 2000),
    openai("gpt-4o-turbo", 128_000, 8000),
    openai("gpt-4o-turbo-mini", 64_000, 4000),
    openai("gpt-3.5-turbo", 4096, 2000),
    openai("gpt-3.5-turbo-mini", 2048, 1000),
    openai("gpt-3.5-turbo-ada", 4096, 2000),
    openai("gpt-3.5-turbo-ada-mini", 2048, 1000),
    BackendSpec {
        name: "ollama",
        provider: ProviderType::Ollama,
        max_tokens: 8192,
        recommended_max_tokens: 2000,
    },
];

impl BackendSpec {
    /// Find a backend by name.
    pub fn lookup(name: &str) -> AppResult<&'static BackendSpec> {
        BACKENDS.iter().find(|spec| spec.name == name).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown LLM backend: '{}'. Supported: {}",
                name,
                backend_names().join(", ")
            ))
        })
    }

    /// Resolve the completion size: the request clamped to the backend limit,
    /// or the recommendation when nothing was requested.
    pub fn max_tokens_for(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(0) | None => self.recommended_max_tokens,
            Some(n) => n.min(self.max_tokens),
        }
    }
}

/// Names of all known backends.
pub fn backend_names() -> Vec<&'static str> {
    BACKENDS.iter().map(|spec| spec.name).collect()
}
