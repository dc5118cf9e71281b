//! Sparse embeddings from a text-embeddings-inference server.
//!
//! `POST /embed_sparse` returns, per input, the nonzero vocabulary entries as
//! `{"index", "value"}` pairs. Vocabulary indices become feature ids.

use crate::embeddings::catalog::EmbeddingModelSpec;
use crate::embeddings::provider::{at_batch, Embedding, EmbeddingProvider, ModelLimits, VectorKind};
use nucrag_core::{AppConfig, AppResult};
use nucrag_llm::http::{build_http_client, read_json, transport_error};
use nucrag_llm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

const BATCH_SIZE: usize = 32;

#[derive(Debug, Serialize)]
struct SparseRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct SparseValue {
    index: u32,
    value: f32,
}

#[derive(Debug, Clone)]
pub struct TeiSparseProvider {
    spec: &'static EmbeddingModelSpec,
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TeiSparseProvider {
    pub fn from_config(spec: &'static EmbeddingModelSpec, config: &AppConfig) -> AppResult<Self> {
        let retry = RetryPolicy::from_config(&config.providers.http);
        Ok(Self {
            spec,
            client: build_http_client(retry.timeout)?,
            base_url: config.providers.tei.endpoint.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<SparseValue>>> {
        let url = format!("{}/embed_sparse", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SparseRequest {
                inputs: texts,
                truncate: true,
            })
            .send()
            .await
            .map_err(|e| transport_error("text-embeddings-inference", e))?;

        read_json("text-embeddings-inference", response).await
    }
}

/// Zero weights are dropped; absent features already count as zero.
fn to_weights(values: Vec<SparseValue>) -> BTreeMap<String, f32> {
    values
        .into_iter()
        .filter(|v| v.value != 0.0)
        .map(|v| (v.index.to_string(), v.value))
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for TeiSparseProvider {
    fn provider_name(&self) -> &str {
        "tei"
    }

    fn model_name(&self) -> &str {
        self.spec.name
    }

    fn kind(&self) -> VectorKind {
        VectorKind::Sparse
    }

    fn limits(&self) -> ModelLimits {
        self.spec.limits
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len()))]
    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            let rows = self
                .retry
                .run("sparse embedding request", || self.embed_request(batch))
                .await
                .map_err(|e| at_batch(batch_index * BATCH_SIZE, e))?;
            embeddings.extend(rows.into_iter().map(|row| Embedding::Sparse(to_weights(row))));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_to_weights() {
        let rows: Vec<Vec<SparseValue>> = serde_json::from_str(
            r#"[[{"index": 2054, "value": 1.25}, {"index": 7, "value": 0.0}, {"index": 99, "value": 0.5}]]"#,
        )
        .unwrap();
        let weights = to_weights(rows.into_iter().next().unwrap());

        assert_eq!(weights.len(), 2);
        assert_eq!(weights["2054"], 1.25);
        assert_eq!(weights["99"], 0.5);
    }

    #[test]
    fn test_from_config() {
        let spec = EmbeddingModelSpec::lookup("atomic-canyon-fermi-nrc").unwrap();
        let provider = TeiSparseProvider::from_config(spec, &AppConfig::default()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080");
        assert_eq!(provider.kind(), VectorKind::Sparse);
        assert_eq!(provider.limits().recommended_chunk, 800);
    }

    #[tokio::test]
    async fn test_transport_failure_names_batch_position() {
        let spec = EmbeddingModelSpec::lookup("atomic-canyon-fermi-nrc").unwrap();
        let mut config = AppConfig::default();
        config.providers.tei.endpoint = "http://127.0.0.1:1".to_string();
        config.providers.http.max_attempts = 1;
        config.providers.http.timeout_secs = 5;

        let provider = TeiSparseProvider::from_config(spec, &config).unwrap();
        let texts = vec!["decay heat removal".to_string(); 2];
        let err = provider.embed_normalized(&texts).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(err.to_string().contains("batch starting at item 0"));
    }
}
