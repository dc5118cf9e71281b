//! Completion dispatch with contained failures.

use nucrag_core::{AppConfig, AppError, AppResult};
use nucrag_llm::{create_client, resolve_model, BackendSpec, LlmClient, LlmRequest, Sampling};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Prefix of every answer produced from a failed completion.
pub const ERROR_MARKER: &str = "Error:";

/// Completion size for registered backends missing from the catalog.
const FALLBACK_MAX_TOKENS: u32 = 2000;

/// Dispatches completions to the selected backend.
///
/// Clients are created on first use and cached for the life of the
/// orchestrator. Failures never escape `complete`; they come back as text
/// starting with `ERROR_MARKER`.
pub struct CompletionOrchestrator {
    config: AppConfig,
    clients: RwLock<HashMap<String, Arc<dyn LlmClient>>>,
}

impl CompletionOrchestrator {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Use `client` for `backend`, bypassing the catalog.
    pub fn register(&self, backend: impl Into<String>, client: Arc<dyn LlmClient>) -> AppResult<()> {
        self.clients
            .write()
            .map_err(|_| AppError::Other("LLM client cache poisoned".to_string()))?
            .insert(backend.into(), client);
        Ok(())
    }

    /// Check that `backend` can be dispatched to, without creating a client.
    pub fn validate_backend(&self, backend: &str) -> AppResult<()> {
        if self.cached(backend)?.is_some() {
            return Ok(());
        }
        BackendSpec::lookup(backend).map(|_| ())
    }

    fn cached(&self, backend: &str) -> AppResult<Option<Arc<dyn LlmClient>>> {
        Ok(self
            .clients
            .read()
            .map_err(|_| AppError::Other("LLM client cache poisoned".to_string()))?
            .get(backend)
            .cloned())
    }

    /// Get or create the client for a backend.
    pub fn client(&self, backend: &str) -> AppResult<Arc<dyn LlmClient>> {
        if let Some(client) = self.cached(backend)? {
            return Ok(client);
        }

        let client = create_client(backend, &self.config)?;
        self.register(backend, Arc::clone(&client))?;
        Ok(client)
    }

    /// Run one completion. Never fails: errors are returned as
    /// `"Error: <cause>"`.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        backend: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> String {
        match self.try_complete(system, prompt, backend, temperature, max_tokens).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Completion with backend '{}' failed: {}", backend, e);
                format!("{} {}", ERROR_MARKER, e)
            }
        }
    }

    async fn try_complete(
        &self,
        system: &str,
        prompt: &str,
        backend: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> AppResult<String> {
        let client = self.client(backend)?;

        let (model, max_tokens) = match BackendSpec::lookup(backend) {
            Ok(spec) => (resolve_model(spec, &self.config), spec.max_tokens_for(max_tokens)),
            Err(_) => (backend.to_string(), max_tokens.unwrap_or(FALLBACK_MAX_TOKENS)),
        };

        tracing::info!(
            "Requesting completion from {} (model: {}, max_tokens: {})",
            client.provider_name(),
            model,
            max_tokens
        );

        let request = LlmRequest::new(model, system, prompt).with_sampling(Sampling {
            temperature,
            max_tokens,
        });

        let response = client.complete(&request).await?;

        tracing::debug!(
            "Completion used {} prompt and {} completion tokens",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        Ok(response.content)
    }
}
