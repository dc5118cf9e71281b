//! Prompt assembly for nucrag.
//!
//! Turns a user query and its ranked context passages into a cited prompt:
//! a fixed system prompt plus a Handlebars-rendered instruction template that
//! quotes every passage and lists its citation.

pub mod builder;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::assemble;
pub use templates::{CITED_TEMPLATE, SYSTEM_PROMPT};
pub use types::{Citation, CitedPrompt, ContextPassage};
