//! LLM client factory.
//!
//! Maps a backend name to a configured client, resolving endpoints and
//! secrets from the environment variables named in the configuration.

use crate::catalog::{BackendSpec, ProviderType};
use crate::client::LlmClient;
use crate::http::build_http_client;
use crate::providers::{AzureOpenAiClient, OllamaClient, OpenAiClient};
use crate::retry::RetryPolicy;
use nucrag_core::config::require_env;
use nucrag_core::{AppConfig, AppResult};
use std::sync::Arc;

/// Create an LLM client for a backend name.
///
/// # Errors
/// Returns error if:
/// - The backend name is unknown
/// - A required environment variable (endpoint or API key) is unset
pub fn create_client(backend: &str, config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let spec = BackendSpec::lookup(backend)?;
    let retry = RetryPolicy::from_config(&config.providers.http);
    let http = build_http_client(retry.timeout)?;

    tracing::debug!("Creating {} client for backend {}", spec.provider.as_str(), spec.name);

    let client: Arc<dyn LlmClient> = match spec.provider {
        ProviderType::Azure => {
            let azure = &config.providers.azure;
            Arc::new(AzureOpenAiClient::new(
                require_env(&azure.endpoint_env)?,
                require_env(&azure.api_key_env)?,
                azure.deployment.clone(),
                azure.api_version.clone(),
                http,
                retry,
            ))
        }
        ProviderType::OpenAI => {
            let openai = &config.providers.openai;
            Arc::new(OpenAiClient::new(
                openai.endpoint.clone(),
                require_env(&openai.api_key_env)?,
                http,
                retry,
            ))
        }
        ProviderType::Ollama => Arc::new(OllamaClient::new(
            config.providers.ollama.endpoint.clone(),
            http,
            retry,
        )),
    };

    Ok(client)
}

/// Model identifier to send for a backend.
///
/// OpenAI backends send their own name, Azure sends the deployment id and
/// Ollama sends the configured local model.
pub fn resolve_model(spec: &BackendSpec, config: &AppConfig) -> String {
    match spec.provider {
        ProviderType::Azure => config.providers.azure.deployment.clone(),
        ProviderType::OpenAI => spec.name.to_string(),
        ProviderType::Ollama => config.providers.ollama.model.clone(),
    }
}
