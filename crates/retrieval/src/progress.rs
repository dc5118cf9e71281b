//! Progress reporting for setup and queries.
//!
//! Setup reports phases through a `ProgressReporter` callback; queries are
//! observed as a finite stream of `QueryEvent`s ending in an answer.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const STATUS_PROCESSING: &str = "Processing your question...";
pub const STATUS_SEARCHING: &str = "Searching relevant documents...";
pub const STATUS_GENERATING: &str = "Generating answer...";
pub const STATUS_COMPLETE: &str = "Complete";
pub const STATUS_ERROR: &str = "Error occurred";

/// One step of a query as seen by a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// Human-readable progress line
    Status(String),

    /// Final answer text; always the last event
    Answer(String),
}

impl QueryEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status(message.into())
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }
}

/// A setup milestone.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupStep {
    Reading { index: usize, total: usize, path: PathBuf },
    Chunked { documents: usize, chunks: usize },
    Embedded { chunks: usize, model: String },
    Exported { path: PathBuf },
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading { index, total, path } => {
                write!(f, "[read {}/{}] {}", index, total, path.display())
            }
            Self::Chunked { documents, chunks } => {
                write!(f, "[chunk] {} chunks from {} documents", chunks, documents)
            }
            Self::Embedded { chunks, model } => write!(f, "[embed] {} chunks with {}", chunks, model),
            Self::Exported { path } => write!(f, "[export] {}", path.display()),
        }
    }
}

/// A step stamped with the time since the reporter was created.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub step: SetupStep,
    pub elapsed: Duration,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}s)", self.step, self.elapsed.as_secs_f64())
    }
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Forwards setup steps to an optional callback and the debug log.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            started: Instant::now(),
        }
    }

    pub fn noop() -> Self {
        Self {
            callback: None,
            started: Instant::now(),
        }
    }

    pub fn report(&self, step: SetupStep) {
        let event = ProgressEvent {
            step,
            elapsed: self.started.elapsed(),
        };
        tracing::debug!("{}", event);

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
