//! Embedding provider trait and vector types.

use crate::normalize::normalize;
use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vector produced by an embedding backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Embedding {
    /// Fixed-length dense vector
    Dense(Vec<f32>),

    /// Feature id to nonnegative weight; absent features are zero
    Sparse(BTreeMap<String, f32>),
}

impl Embedding {
    pub fn kind(&self) -> VectorKind {
        match self {
            Self::Dense(values) => VectorKind::Dense {
                dimensions: values.len(),
            },
            Self::Sparse(_) => VectorKind::Sparse,
        }
    }
}

/// Shape of the vectors a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorKind {
    Dense { dimensions: usize },
    Sparse,
}

impl std::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dense { dimensions } => write!(f, "dense ({} dims)", dimensions),
            Self::Sparse => write!(f, "sparse"),
        }
    }
}

/// Input limits and chunking recommendations for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimits {
    pub max_tokens: usize,
    pub recommended_chunk: usize,
    pub recommended_overlap: usize,
}

/// Trait for embedding providers.
///
/// Implementors supply `embed_normalized`; callers use `embed` and
/// `embed_batch`, which normalize input text and validate every returned
/// vector against `kind()`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "openai", "tei")
    fn provider_name(&self) -> &str;

    /// Get the catalog model name
    fn model_name(&self) -> &str;

    fn kind(&self) -> VectorKind;

    fn limits(&self) -> ModelLimits;

    /// Embed texts that have already been normalized, one vector per text.
    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>>;

    /// Normalize and embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        let embeddings = self.embed_normalized(&normalized).await?;
        validate_embeddings(self.kind(), texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    /// Normalize and embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Embedding> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Check a backend response: one vector per input, of the declared kind,
/// finite, with nonnegative sparse weights.
pub fn validate_embeddings(
    kind: VectorKind,
    expected: usize,
    embeddings: &[Embedding],
) -> AppResult<()> {
    if embeddings.len() != expected {
        return Err(AppError::Embedding(format!(
            "Backend returned {} vectors for {} inputs",
            embeddings.len(),
            expected
        )));
    }

    for (index, embedding) in embeddings.iter().enumerate() {
        match (kind, embedding) {
            (VectorKind::Dense { dimensions }, Embedding::Dense(values)) => {
                if values.len() != dimensions {
                    return Err(AppError::Embedding(format!(
                        "Item {}: expected {} dimensions, got {}",
                        index,
                        dimensions,
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(AppError::Embedding(format!(
                        "Item {}: vector contains non-finite values",
                        index
                    )));
                }
            }
            (VectorKind::Sparse, Embedding::Sparse(weights)) => {
                if let Some((feature, weight)) =
                    weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0)
                {
                    return Err(AppError::Embedding(format!(
                        "Item {}: invalid weight {} for feature '{}'",
                        index, weight, feature
                    )));
                }
            }
            (expected_kind, other) => {
                return Err(AppError::Embedding(format!(
                    "Item {}: expected a {} vector, got {}",
                    index,
                    expected_kind,
                    other.kind()
                )));
            }
        }
    }

    Ok(())
}

/// Prefix a batch failure with the position of the batch's first item.
/// Variants are kept.
pub fn at_batch(start: usize, error: AppError) -> AppError {
    let locate = |message: String| format!("batch starting at item {}: {}", start, message);
    match error {
        AppError::Embedding(m) => AppError::Embedding(locate(m)),
        AppError::Backend(m) => AppError::Backend(locate(m)),
        AppError::BackendNetwork(m) => AppError::BackendNetwork(locate(m)),
        AppError::BackendAuth(m) => AppError::BackendAuth(locate(m)),
        other => other,
    }
}
