//! Dense embeddings from a local Ollama runtime via the batch `/api/embed`
//! endpoint. The catalog model `all-MiniLM-L6-v2` is served under the tag in
//! `providers.ollama.embeddingModel` (default `all-minilm`).

use crate::embeddings::catalog::EmbeddingModelSpec;
use crate::embeddings::provider::{at_batch, Embedding, EmbeddingProvider, ModelLimits, VectorKind};
use nucrag_core::{AppConfig, AppError, AppResult};
use nucrag_llm::http::{build_http_client, read_json, transport_error};
use nucrag_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Texts per `/api/embed` call.
const BATCH_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    spec: &'static EmbeddingModelSpec,
    client: reqwest::Client,
    embed_url: String,
    model_tag: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct EmbedBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedReply {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    pub fn from_config(spec: &'static EmbeddingModelSpec, config: &AppConfig) -> AppResult<Self> {
        let retry = RetryPolicy::from_config(&config.providers.http);
        Ok(Self {
            spec,
            client: build_http_client(retry.timeout)?,
            embed_url: format!(
                "{}/api/embed",
                config.providers.ollama.endpoint.trim_end_matches('/')
            ),
            model_tag: config.providers.ollama.embedding_model.clone(),
            retry,
        })
    }

    async fn embed_batch_once(&self, batch: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let body = EmbedBody {
            model: &self.model_tag,
            input: batch,
        };

        let response = self
            .client
            .post(&self.embed_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Ollama", e))?;

        let reply: EmbedReply = read_json("Ollama", response).await?;
        if reply.embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} vectors for {} inputs",
                reply.embeddings.len(),
                batch.len()
            )));
        }
        Ok(reply.embeddings)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
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

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model_tag))]
    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            let vectors = self
                .retry
                .run("Ollama embedding", || self.embed_batch_once(batch))
                .await
                .map_err(|e| at_batch(batch_index * BATCH_SIZE, e))?;
            embeddings.extend(vectors.into_iter().map(Embedding::Dense));
        }

        debug!("Embedded {} texts with Ollama", embeddings.len());
        Ok(embeddings)
    }
}
