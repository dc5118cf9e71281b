//! The in-memory corpus: chunks paired with their vectors.

use crate::chunker::Chunk;
use crate::embeddings::{Embedding, VectorKind};
use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub chunk: Chunk,
    pub embedding: Embedding,
}

/// Chunks and vectors from one setup run, all produced by one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    model: String,
    kind: VectorKind,
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Pair chunks with their vectors.
    ///
    /// # Errors
    /// `AppError::Embedding` when the counts differ or a vector does not
    /// match `kind`.
    pub fn new(
        model: impl Into<String>,
        kind: VectorKind,
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
    ) -> AppResult<Self> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Embedding(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                if embedding.kind() == kind {
                    Ok(CorpusEntry { chunk, embedding })
                } else {
                    Err(AppError::Embedding(format!(
                        "Chunk {}: {} vector in a {} corpus",
                        chunk.id,
                        embedding.kind(),
                        kind
                    )))
                }
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            model: model.into(),
            kind,
            entries,
        })
    }

    /// Corpus with no chunks.
    pub fn empty(model: impl Into<String>, kind: VectorKind) -> Self {
        Self {
            model: model.into(),
            kind,
            entries: Vec::new(),
        }
    }

    /// Embedding model that produced the vectors.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct source documents.
    pub fn document_count(&self) -> usize {
        let mut documents: Vec<&str> = self.chunks().map(|c| c.document.as_str()).collect();
        documents.sort_unstable();
        documents.dedup();
        documents.len()
    }
}
