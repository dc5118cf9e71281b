//! OpenAI embeddings, served either by OpenAI or by an Azure OpenAI deployment.

use crate::embeddings::catalog::EmbeddingModelSpec;
use crate::embeddings::provider::{at_batch, Embedding, EmbeddingProvider, ModelLimits, VectorKind};
use nucrag_core::config::require_env;
use nucrag_core::{AppConfig, AppError, AppResult};
use nucrag_llm::http::{build_http_client, read_json, transport_error};
use nucrag_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Inputs per request. Azure deployments cap embedding batches at 16.
const BATCH_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    OpenAi {
        endpoint: String,
        api_key: String,
    },
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Dense embeddings from the OpenAI embeddings API.
///
/// Uses the Azure deployment named by `providers.azure.embeddingDeployment`
/// when set, OpenAI otherwise.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingProvider {
    spec: &'static EmbeddingModelSpec,
    client: reqwest::Client,
    target: Target,
    retry: RetryPolicy,
}

impl OpenAiEmbeddingProvider {
    pub fn from_config(spec: &'static EmbeddingModelSpec, config: &AppConfig) -> AppResult<Self> {
        let azure = &config.providers.azure;
        let target = match &azure.embedding_deployment {
            Some(deployment) => Target::Azure {
                endpoint: require_env(&azure.embedding_endpoint_env)?,
                api_key: require_env(&azure.embedding_api_key_env)?,
                deployment: deployment.clone(),
                api_version: std::env::var(&azure.embedding_api_version_env)
                    .unwrap_or_else(|_| azure.api_version.clone()),
            },
            None => Target::OpenAi {
                endpoint: config.providers.openai.endpoint.clone(),
                api_key: require_env(&config.providers.openai.api_key_env)?,
            },
        };

        let retry = RetryPolicy::from_config(&config.providers.http);
        Ok(Self {
            spec,
            client: build_http_client(retry.timeout)?,
            target,
            retry,
        })
    }

    fn url(&self) -> String {
        match &self.target {
            Target::OpenAi { endpoint, .. } => {
                format!("{}/embeddings", endpoint.trim_end_matches('/'))
            }
            Target::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            } => format!(
                "{}/openai/deployments/{}/embeddings?api-version={}",
                endpoint.trim_end_matches('/'),
                deployment,
                api_version
            ),
        }
    }

    fn backend_label(&self) -> &'static str {
        match self.target {
            Target::OpenAi { .. } => "OpenAI",
            Target::Azure { .. } => "Azure OpenAI",
        }
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: match self.target {
                Target::OpenAi { .. } => Some(self.spec.name),
                Target::Azure { .. } => None,
            },
        };

        let builder = self.client.post(self.url()).json(&request);
        let builder = match &self.target {
            Target::OpenAi { api_key, .. } => builder.bearer_auth(api_key),
            Target::Azure { api_key, .. } => builder.header("api-key", api_key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(self.backend_label(), e))?;
        let body: EmbeddingResponse = read_json(self.backend_label(), response).await?;

        order_by_index(body.data, texts.len())
    }
}

/// Put response items back in input order, requiring exactly one per input.
fn order_by_index(data: Vec<EmbeddingData>, expected: usize) -> AppResult<Vec<Vec<f32>>> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            AppError::Embedding(format!("Response index {} out of range", item.index))
        })?;
        *slot = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| AppError::Embedding(format!("No embedding returned for item {}", i)))
        })
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn provider_name(&self) -> &str {
        match self.target {
            Target::OpenAi { .. } => "openai",
            Target::Azure { .. } => "azure",
        }
    }

    fn model_name(&self) -> &str {
        self.spec.name
    }

    fn kind(&self) -> VectorKind {
        self.spec.kind
    }

    fn limits(&self) -> ModelLimits {
        self.spec.limits
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = self.provider_name()))]
    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            let vectors = self
                .retry
                .run("embedding request", || self.embed_request(batch))
                .await
                .map_err(|e| at_batch(batch_index * BATCH_SIZE, e))?;
            embeddings.extend(vectors.into_iter().map(Embedding::Dense));
        }

        Ok(embeddings)
    }
}
