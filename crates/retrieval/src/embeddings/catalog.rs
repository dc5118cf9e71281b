//! Catalog of selectable embedding models.

use super::provider::{EmbeddingProvider, ModelLimits, VectorKind};
use super::providers::{
    lexical::LexicalProvider, ollama::OllamaProvider, openai::OpenAiEmbeddingProvider,
    tei::TeiSparseProvider, trigram::TrigramProvider,
};
use crate::chunker::ChunkConfig;
use nucrag_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

/// Transport used to compute a model's vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Local Ollama runtime
    Ollama,
    /// OpenAI, or an Azure deployment when one is configured
    OpenAi,
    /// text-embeddings-inference sparse endpoint
    Tei,
    /// Offline hashed character trigrams
    Trigram,
    /// Offline term weights
    Lexical,
}

/// A selectable embedding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingModelSpec {
    pub name: &'static str,
    pub kind: VectorKind,
    pub limits: ModelLimits,
    pub backend: EmbeddingBackend,
}

const fn spec(
    name: &'static str,
    kind: VectorKind,
    max_tokens: usize,
    recommended_chunk: usize,
    recommended_overlap: usize,
    backend: EmbeddingBackend,
) -> EmbeddingModelSpec {
    EmbeddingModelSpec {
        name,
        kind,
        limits: ModelLimits {
            max_tokens,
            recommended_chunk,
            recommended_overlap,
        },
        backend,
    }
}

/// Every known embedding model, default first.
pub const EMBEDDING_MODELS: &[EmbeddingModelSpec] = &[
    spec(
        "all-MiniLM-L6-v2",
        VectorKind::Dense { dimensions: 384 },
        256,
        256,
        50,
        EmbeddingBackend::Ollama,
    ),
    spec(
        "text-embedding-ada-002",
        VectorKind::Dense { dimensions: 1536 },
        8191,
        1000,
        300,
        EmbeddingBackend::OpenAi,
    ),
    spec(
        "atomic-canyon-fermi-nrc",
        VectorKind::Sparse,
        1024,
        800,
        300,
        EmbeddingBackend::Tei,
    ),
    spec(
        "trigram",
        VectorKind::Dense { dimensions: 384 },
        8192,
        256,
        50,
        EmbeddingBackend::Trigram,
    ),
    spec("lexical", VectorKind::Sparse, 8192, 256, 50, EmbeddingBackend::Lexical),
];

impl EmbeddingModelSpec {
    /// Find a model by name.
    pub fn lookup(name: &str) -> AppResult<&'static EmbeddingModelSpec> {
        EMBEDDING_MODELS
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Unknown embedding model: '{}'. Supported: {}",
                    name,
                    model_names().join(", ")
                ))
            })
    }

    /// Chunk settings: explicit values where given, the model's
    /// recommendation otherwise.
    pub fn chunk_config(&self, chunk_size: Option<usize>, overlap: Option<usize>) -> AppResult<ChunkConfig> {
        ChunkConfig::new(
            chunk_size.unwrap_or(self.limits.recommended_chunk),
            overlap.unwrap_or(self.limits.recommended_overlap),
        )
    }
}

/// Names of all known embedding models.
pub fn model_names() -> Vec<&'static str> {
    EMBEDDING_MODELS.iter().map(|spec| spec.name).collect()
}

/// Create the provider for a catalog model.
///
/// # Errors
/// `AppError::Config` when a required endpoint or API key is not set.
pub fn create_provider(
    spec: &'static EmbeddingModelSpec,
    config: &AppConfig,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match spec.backend {
        EmbeddingBackend::Trigram => Arc::new(TrigramProvider::new(spec)),
        EmbeddingBackend::Lexical => Arc::new(LexicalProvider::new(spec)),
        EmbeddingBackend::Ollama => Arc::new(OllamaProvider::from_config(spec, config)?),
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbeddingProvider::from_config(spec, config)?),
        EmbeddingBackend::Tei => Arc::new(TeiSparseProvider::from_config(spec, config)?),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let spec = EmbeddingModelSpec::lookup("text-embedding-ada-002").unwrap();
        assert_eq!(spec.kind, VectorKind::Dense { dimensions: 1536 });
        assert_eq!(spec.limits.max_tokens, 8191);

        let sparse = EmbeddingModelSpec::lookup("atomic-canyon-fermi-nrc").unwrap();
        assert_eq!(sparse.kind, VectorKind::Sparse);
    }

    #[test]
    fn test_lookup_unknown() {
        let err = EmbeddingModelSpec::lookup("bert-base").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("all-MiniLM-L6-v2"));
    }

    #[test]
    fn test_chunk_config_defaults_from_model() {
        let spec = EmbeddingModelSpec::lookup("atomic-canyon-fermi-nrc").unwrap();
        assert_eq!(spec.chunk_config(None, None).unwrap(), ChunkConfig::new(800, 300).unwrap());
        assert!(spec
            .chunk_config(Some(100), None)
            .unwrap_err()
            .to_string()
            .contains("overlap"));
        assert_eq!(spec.chunk_config(Some(100), Some(10)).unwrap().step(), 90);
    }

    #[test]
    fn test_offline_providers_need_no_config() {
        let config = AppConfig::default();
        for name in ["trigram", "lexical"] {
            let spec = EmbeddingModelSpec::lookup(name).unwrap();
            let provider = create_provider(spec, &config).unwrap();
            assert_eq!(provider.model_name(), name);
            assert_eq!(provider.kind(), spec.kind);
        }
    }
}
