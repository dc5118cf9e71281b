//! Local Ollama runtime, `/api/generate` without streaming.
//!
//! API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::http::{read_json, transport_error};
use crate::retry::RetryPolicy;
use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const LABEL: &str = "Ollama";

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: GenerateOptions,
    stream: bool,
}

/// Ollama spells the token budget `num_predict`.
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

fn generate_body(request: &LlmRequest) -> GenerateBody<'_> {
    GenerateBody {
        model: &request.model,
        prompt: &request.prompt,
        system: request.system_message(),
        options: GenerateOptions {
            temperature: request.sampling.temperature,
            num_predict: request.sampling.max_tokens,
        },
        stream: false,
    }
}

fn into_response(reply: GenerateReply, requested_model: &str) -> AppResult<LlmResponse> {
    if reply.response.trim().is_empty() {
        return Err(AppError::Backend(format!("{} returned no completion text", LABEL)));
    }

    Ok(LlmResponse {
        content: reply.response,
        model: reply.model.unwrap_or_else(|| requested_model.to_string()),
        usage: LlmUsage::from_counts(reply.prompt_eval_count, reply.eval_count),
    })
}

/// Completion client for a local Ollama server.
pub struct OllamaClient {
    generate_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client, retry: RetryPolicy) -> Self {
        let base_url = base_url.into();
        Self {
            generate_url: format!("{}/api/generate", base_url.trim_end_matches('/')),
            client,
            retry,
        }
    }

    async fn send(&self, body: &GenerateBody<'_>) -> AppResult<GenerateReply> {
        let response = self
            .client
            .post(&self.generate_url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(LABEL, e))?;

        read_json(LABEL, response).await
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Ollama generate with {} ({} prompt chars)",
            request.model,
            request.prompt.len()
        );

        let body = generate_body(request);
        let reply = self.retry.run("Ollama completion", || self.send(&body)).await?;
        into_response(reply, &request.model)
    }
}
