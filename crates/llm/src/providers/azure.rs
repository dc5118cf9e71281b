//! Azure OpenAI chat completions client.
//!
//! The deployment id selects the model; requests carry no `model` field.

use super::openai::ChatRequest;
use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::http::{read_json, transport_error};
use crate::retry::RetryPolicy;
use nucrag_core::AppResult;

pub struct AzureOpenAiClient {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl AzureOpenAiClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        client: reqwest::Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            client,
            retry,
        }
    }

    /// Chat completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    async fn send(&self, body: &ChatRequest) -> AppResult<super::openai::ChatResponse> {
        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error("Azure OpenAI", e))?;

        read_json("Azure OpenAI", response).await
    }
}

#[async_trait::async_trait]
impl LlmClient for AzureOpenAiClient {
    fn provider_name(&self) -> &str {
        "azure"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Azure deployment {}", self.deployment);

        let body = ChatRequest::from_request(request, None);
        let response = self
            .retry
            .run("Azure OpenAI completion", || self.send(&body))
            .await?;

        response.into_response("Azure OpenAI", &self.deployment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        let client = AzureOpenAiClient::new(
            "https://example.openai.azure.com/",
            "key",
            "gpt4-testing-app",
            "2024-05-01-preview",
            reqwest::Client::new(),
            RetryPolicy::default(),
        );

        assert_eq!(
            client.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt4-testing-app/chat/completions?api-version=2024-05-01-preview"
        );
        assert_eq!(client.provider_name(), "azure");
    }
}
