//! Prompt input and output types.

use serde::{Deserialize, Serialize};

/// One retrieved passage offered to the model as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPassage {
    /// Chunk identifier within the corpus
    pub chunk_id: usize,

    /// 1-based page number
    pub page: u32,

    /// Link to the page (`<document link>#page=<page>`)
    pub link: String,

    /// Paragraph the chunk was cut from, quoted verbatim
    pub source_paragraph: String,
}

/// A citation listed under the prompt's sources section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: usize,
    pub page: u32,
    pub link: String,
}

impl Citation {
    /// Render as a markdown list item.
    pub fn to_markdown(&self) -> String {
        format!(
            "- Chunk {}, Page {}: [{}]({})",
            self.chunk_id, self.page, self.link, self.link
        )
    }
}

impl From<&ContextPassage> for Citation {
    fn from(passage: &ContextPassage) -> Self {
        Self {
            chunk_id: passage.chunk_id,
            page: passage.page,
            link: passage.link.clone(),
        }
    }
}

/// A fully assembled prompt, ready for a completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedPrompt {
    /// System message
    pub system: String,

    /// User message: instructions, context, query and sources
    pub user: String,

    /// Citations in ranked order
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_markdown() {
        let citation = Citation {
            chunk_id: 7,
            page: 3,
            link: "file:///docs/a.pdf#page=3".to_string(),
        };
        assert_eq!(
            citation.to_markdown(),
            "- Chunk 7, Page 3: [file:///docs/a.pdf#page=3](file:///docs/a.pdf#page=3)"
        );
    }
}
