//! Offline sparse provider weighting terms by `ln(1 + tf)`.

use super::trigram::STOP_WORDS;
use crate::embeddings::catalog::EmbeddingModelSpec;
use crate::embeddings::provider::{Embedding, EmbeddingProvider, ModelLimits, VectorKind};
use nucrag_core::AppResult;
use std::collections::BTreeMap;

/// Sparse term-weight vectors without any model: one feature per lowercase
/// term, stop words dropped.
#[derive(Debug)]
pub struct LexicalProvider {
    spec: &'static EmbeddingModelSpec,
}

impl LexicalProvider {
    pub fn new(spec: &'static EmbeddingModelSpec) -> Self {
        Self { spec }
    }

    fn term_weights(text: &str) -> BTreeMap<String, f32> {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for term in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(t))
        {
            *counts.entry(term.to_string()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(term, tf)| (term, (1.0 + tf as f32).ln()))
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LexicalProvider {
    fn provider_name(&self) -> &str {
        "lexical"
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

    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|text| Embedding::Sparse(Self::term_weights(text)))
            .collect())
    }
}
