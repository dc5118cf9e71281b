//! Retrieval pipeline for nucrag.
//!
//! PDF documents are split into paragraphs, stored, cut into overlapping
//! word windows and embedded with a selectable backend. Queries are embedded
//! with the same backend, ranked by cosine similarity against every chunk,
//! and answered by a language model from a cited prompt.
//!
//! # Example
//! ```no_run
//! use nucrag_core::AppConfig;
//! use nucrag_retrieval::{CompletionSettings, Pipeline};
//! use std::path::PathBuf;
//!
//! # async fn example() -> nucrag_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let pipeline = Pipeline::from_config(&config)?;
//!
//! let (corpus, message) = pipeline
//!     .setup(&[PathBuf::from("docs")], "trigram", "ollama", None, None)
//!     .await?;
//! println!("{}", message);
//!
//! let completion = CompletionSettings {
//!     backend: "ollama",
//!     temperature: 0.5,
//!     max_tokens: None,
//! };
//! let answer = pipeline
//!     .answer("What is GDC 55?", "trigram", 20.0, &corpus, completion)
//!     .await;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod corpus;
pub mod document;
pub mod embeddings;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod rag;
pub mod rank;
pub mod store;

// Re-export commonly used types
pub use chunker::{Chunk, ChunkConfig};
pub use corpus::{Corpus, CorpusEntry};
pub use document::{Document, DocumentReader, PdfReader};
pub use embeddings::{Embedding, EmbeddingEngine, EmbeddingProvider, ModelLimits, VectorKind};
pub use pipeline::{CompletionSettings, Pipeline, QUERY_ERROR_PREFIX};
pub use progress::{ProgressEvent, ProgressReporter, QueryEvent, SetupStep};
pub use rag::{CompletionOrchestrator, ERROR_MARKER};
pub use rank::{rank, score_all, RankedChunk};
pub use store::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};
