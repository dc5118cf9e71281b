//! Extracted documents and the readers that produce them.

use nucrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Paragraphs extracted from one file, grouped by 1-based page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name the document was read from
    pub filename: String,

    /// Link to the document (`file://` URI for local files)
    pub link: String,

    /// Page number to ordered paragraphs
    pub pages: BTreeMap<u32, Vec<String>>,
}

impl Document {
    pub fn new(filename: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            link: link.into(),
            pages: BTreeMap::new(),
        }
    }

    /// Builder-style page insertion.
    pub fn with_page(mut self, page: u32, paragraphs: Vec<String>) -> Self {
        self.pages.insert(page, paragraphs);
        self
    }

    pub fn paragraph_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Link to a page within the document.
    pub fn page_link(&self, page: u32) -> String {
        format!("{}#page={}", self.link, page)
    }
}

/// Produces a `Document` from a file.
#[async_trait::async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read(&self, path: &Path) -> AppResult<Document>;
}

/// PDF reader backed by `pdf-extract`.
///
/// Each page's text is split into paragraphs at blank lines; the lines of a
/// paragraph are joined with single spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

#[async_trait::async_trait]
impl DocumentReader for PdfReader {
    async fn read(&self, path: &Path) -> AppResult<Document> {
        let absolute = absolute_path(path)?;
        let filename = absolute
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Document(format!("Not a file: {}", path.display())))?;
        let link = file_link(&absolute)?;

        let bytes = tokio::fs::read(&absolute)
            .await
            .map_err(|e| AppError::Document(format!("Failed to read {}: {}", absolute.display(), e)))?;

        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| AppError::Document(format!("PDF extraction aborted: {}", e)))?
        .map_err(|e| AppError::Document(format!("PDF extraction error in {}: {}", filename, e)))?;

        let mut document = Document::new(filename, link);
        for (index, text) in pages.iter().enumerate() {
            document.pages.insert(index as u32 + 1, split_paragraphs(text));
        }

        tracing::debug!(
            "Extracted {} paragraphs over {} pages from {}",
            document.paragraph_count(),
            document.pages.len(),
            document.filename
        );

        Ok(document)
    }
}

/// Split page text into paragraphs: runs of non-blank lines joined by spaces.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// `file://` URI for an absolute path.
pub fn file_link(path: &Path) -> AppResult<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| AppError::Document(format!("Cannot build a link for {}", path.display())))
}

fn absolute_path(path: &Path) -> AppResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
