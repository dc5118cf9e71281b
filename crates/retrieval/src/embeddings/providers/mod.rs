//! Embedding provider implementations.

pub mod lexical;
pub mod ollama;
pub mod openai;
pub mod tei;
pub mod trigram;
