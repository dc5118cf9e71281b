//! Offline dense provider built from hashed character trigrams.

use crate::embeddings::catalog::EmbeddingModelSpec;
use crate::embeddings::provider::{Embedding, EmbeddingProvider, ModelLimits, VectorKind};
use nucrag_core::AppResult;
use std::collections::BTreeMap;

/// Words too common to discriminate between passages.
pub(crate) const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "had", "has",
    "have", "in", "is", "it", "its", "of", "on", "or", "shall", "that", "the", "their",
    "them", "they", "this", "to", "was", "were", "which", "with",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(seed, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// Lowercase words of three or more characters, stop words dropped, counted.
fn content_words(text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() > 2 && !STOP_WORDS.contains(&word) {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Deterministic unit vectors for setup and queries with no service
/// running. Each word adds `sqrt(tf)` to the bucket of every character
/// trigram it contains and `tf` to a bucket for the whole word.
#[derive(Debug)]
pub struct TrigramProvider {
    spec: &'static EmbeddingModelSpec,
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(spec: &'static EmbeddingModelSpec) -> Self {
        let dimensions = match spec.kind {
            VectorKind::Dense { dimensions } => dimensions,
            VectorKind::Sparse => 384,
        };
        Self { spec, dimensions }
    }

    fn bucket(&self, seed: u64, bytes: &[u8]) -> usize {
        (fnv1a(seed, bytes) % self.dimensions as u64) as usize
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimensions];

        for (word, tf) in content_words(text) {
            let chars: Vec<char> = word.chars().collect();
            let mut buf = [0u8; 12];
            for window in chars.windows(3) {
                let mut len = 0;
                for c in window {
                    len += c.encode_utf8(&mut buf[len..]).len();
                }
                values[self.bucket(FNV_OFFSET, &buf[..len])] += (tf as f32).sqrt();
            }

            values[self.bucket(FNV_OFFSET ^ 0x5bd1_e995, word.as_bytes())] += tf as f32;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        self.spec.name
    }

    fn kind(&self) -> VectorKind {
        VectorKind::Dense {
            dimensions: self.dimensions,
        }
    }

    fn limits(&self) -> ModelLimits {
        self.spec.limits
    }

    async fn embed_normalized(&self, texts: &[String]) -> AppResult<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|text| Embedding::Dense(self.vector(text)))
            .collect())
    }
}
