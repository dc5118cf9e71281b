//! OpenAI chat completions client.
//!
//! API: https://platform.openai.com/docs/api-reference/chat

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::http::{read_json, transport_error};
use crate::retry::RetryPolicy;
use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Chat completions request body, shared with the Azure client.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn from_request(request: &LlmRequest, model: Option<String>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_message() {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        Self {
            model,
            messages,
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Convert to an `LlmResponse`, failing when no text came back.
    pub fn into_response(self, backend: &str, fallback_model: &str) -> AppResult<LlmResponse> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Backend(format!("{} returned no completion text", backend)))?;

        let usage = self
            .usage
            .map(|u| LlmUsage::from_counts(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            usage,
        })
    }
}

/// OpenAI client. The backend name is sent as the model.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: reqwest::Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            retry,
        }
    }

    async fn send(&self, body: &ChatRequest) -> AppResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", e))?;

        read_json("OpenAI", response).await
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to OpenAI ({})", request.model);

        let body = ChatRequest::from_request(request, Some(request.model.clone()));
        let response = self.retry.run("OpenAI completion", || self.send(&body)).await?;

        tracing::debug!("OpenAI returned {} choices", response.choices.len());
        response.into_response("OpenAI", &request.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Sampling;

    #[test]
    fn test_chat_request_includes_system_first() {
        let request = LlmRequest::new("gpt-4o", "You are helpful.", "What is a scram?")
            .with_sampling(Sampling {
                temperature: 0.5,
                max_tokens: 100,
            });
        let body = ChatRequest::from_request(&request, Some("gpt-4o".to_string()));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "What is a scram?");
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn test_chat_request_omits_model_when_none() {
        let request = LlmRequest::new("AzureGPT", "", "hi");
        let json = serde_json::to_value(ChatRequest::from_request(&request, None)).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_conversion() {
        let body = r#"{
            "model": "gpt-4o-2024",
            "choices": [{"message": {"role": "assistant", "content": "A scram is an emergency shutdown."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let response = parsed.into_response("OpenAI", "gpt-4o").unwrap();

        assert_eq!(response.content, "A scram is an emergency shutdown.");
        assert_eq!(response.model, "gpt-4o-2024");
        assert_eq!(response.usage.total_tokens, 19);
    }

    #[test]
    fn test_empty_choices_is_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = parsed.into_response("OpenAI", "gpt-4o").unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }
}
