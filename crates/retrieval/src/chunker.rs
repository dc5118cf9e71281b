//! Word-window chunking with configurable size and overlap.

use crate::document::Document;
use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Window size and overlap, both counted in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        let config = Self { chunk_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Require `chunk_size > 0` and `overlap < chunk_size`.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk size must be greater than zero".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Words the window advances between consecutive chunks.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// A window of words cut from one paragraph, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in corpus emission order
    pub id: usize,

    /// Window words joined with single spaces
    pub text: String,

    /// Paragraph the window was cut from, verbatim
    pub source_paragraph: String,

    /// 1-based page number
    pub page: u32,

    /// `<document link>#page=<page>`
    pub link: String,

    /// Filename of the source document
    pub document: String,
}

/// Split one paragraph into word windows.
///
/// The window advances by `step` words; the window that reaches the end of
/// the paragraph is the last one. A paragraph with no words yields nothing.
pub fn split_words(paragraph: &str, config: &ChunkConfig) -> Vec<String> {
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    let mut windows = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        windows.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += config.step();
    }

    windows
}

/// Chunk documents in order: document, page, paragraph, window.
///
/// # Errors
/// `AppError::Config` when the chunk settings are invalid; checked before
/// any document is touched.
pub fn chunk_documents(documents: &[Document], config: &ChunkConfig) -> AppResult<Vec<Chunk>> {
    config.validate()?;

    let mut chunks = Vec::new();

    for document in documents {
        for (&page, paragraphs) in &document.pages {
            let link = document.page_link(page);
            for paragraph in paragraphs {
                for text in split_words(paragraph, config) {
                    chunks.push(Chunk {
                        id: chunks.len(),
                        text,
                        source_paragraph: paragraph.clone(),
                        page,
                        link: link.clone(),
                        document: document.filename.clone(),
                    });
                }
            }
        }
    }

    tracing::debug!(
        "Chunked {} documents into {} chunks (size {}, overlap {})",
        documents.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(chunks)
}
