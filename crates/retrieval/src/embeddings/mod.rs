//! Embedding engine.
//!
//! Resolves catalog model names to providers, caches them for the life of the
//! engine, and embeds chunks and queries.

pub mod catalog;
pub mod provider;
pub mod providers;

pub use catalog::{create_provider, model_names, EmbeddingBackend, EmbeddingModelSpec, EMBEDDING_MODELS};
pub use provider::{Embedding, EmbeddingProvider, ModelLimits, VectorKind};

use crate::chunker::Chunk;
use nucrag_core::{AppConfig, AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Central embedding engine that manages one provider per model name.
pub struct EmbeddingEngine {
    config: AppConfig,
    providers: RwLock<HashMap<String, Arc<dyn EmbeddingProvider>>>,
}

impl EmbeddingEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Use `provider` for `name`, bypassing the catalog.
    pub fn register(&self, name: impl Into<String>, provider: Arc<dyn EmbeddingProvider>) -> AppResult<()> {
        self.providers
            .write()
            .map_err(|_| AppError::Other("Embedding provider cache poisoned".to_string()))?
            .insert(name.into(), provider);
        Ok(())
    }

    /// Get or create the provider for a model name.
    ///
    /// # Errors
    /// `AppError::Config` for an unknown model or missing credentials.
    pub fn provider(&self, name: &str) -> AppResult<Arc<dyn EmbeddingProvider>> {
        // Check cache first
        {
            let providers = self
                .providers
                .read()
                .map_err(|_| AppError::Other("Embedding provider cache poisoned".to_string()))?;
            if let Some(provider) = providers.get(name) {
                return Ok(Arc::clone(provider));
            }
        }

        let spec = EmbeddingModelSpec::lookup(name)?;
        let provider = create_provider(spec, &self.config)?;

        tracing::debug!(
            "Created embedding provider for '{}': provider={}, kind={}",
            name,
            provider.provider_name(),
            provider.kind()
        );

        self.register(name, Arc::clone(&provider))?;
        Ok(provider)
    }

    /// Embed chunk texts, one vector per chunk.
    ///
    /// Any failure aborts the whole batch.
    pub async fn embed_chunks(&self, model: &str, chunks: &[Chunk]) -> AppResult<Vec<Embedding>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider(model)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        tracing::info!(
            "Embedding {} chunks using provider '{}' (model: {})",
            texts.len(),
            provider.provider_name(),
            provider.model_name()
        );

        provider.embed_batch(&texts).await
    }

    pub async fn embed_query(&self, model: &str, query: &str) -> AppResult<Embedding> {
        self.provider(model)?.embed(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: usize, text: &str) -> Chunk {
        Chunk {
            id,
            text: text.to_string(),
            source_paragraph: text.to_string(),
            page: 1,
            link: "file:///a.pdf#page=1".to_string(),
            document: "a.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_embed_chunks_with_trigram() {
        let engine = EmbeddingEngine::new(AppConfig::default());
        let chunks = vec![chunk(0, "hello world"), chunk(1, "test embedding")];

        let embeddings = engine.embed_chunks("trigram", &chunks).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].kind(), VectorKind::Dense { dimensions: 384 });
    }

    #[tokio::test]
    async fn test_provider_caching() {
        let engine = EmbeddingEngine::new(AppConfig::default());
        let first = engine.provider("lexical").unwrap();
        let second = engine.provider("lexical").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_model() {
        let engine = EmbeddingEngine::new(AppConfig::default());
        assert!(matches!(engine.provider("word2vec"), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_registered_provider_wins() {
        let engine = EmbeddingEngine::new(AppConfig::default());
        let lexical = create_provider(EmbeddingModelSpec::lookup("lexical").unwrap(), &AppConfig::default()).unwrap();
        engine.register("custom", lexical).unwrap();

        let embedding = engine.embed_query("custom", "decay heat").await.unwrap();
        assert_eq!(embedding.kind(), VectorKind::Sparse);
    }
}
