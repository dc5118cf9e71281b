//! Cited answering: prompt assembly over ranked chunks and completion.

pub mod ask;
pub mod orchestrator;

pub use ask::{generate_answer, to_passages};
pub use orchestrator::{CompletionOrchestrator, ERROR_MARKER};
