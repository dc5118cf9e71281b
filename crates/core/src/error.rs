//! Error types for nucrag.
//!
//! A single error enum covers every failure category in the workspace:
//! configuration, backend (auth, network, other), embedding, document,
//! prompt and I/O errors.

use thiserror::Error;

/// Unified error type for nucrag.
///
/// All fallible functions return `Result<T, AppError>`. Backend failures are
/// split by cause so callers can decide between retrying, aborting setup and
/// surfacing a readable message.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid settings, unknown backend or model names, missing credentials
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend rejected the credentials (HTTP 401/403)
    #[error("Backend authentication error: {0}")]
    BackendAuth(String),

    /// Backend unreachable, timed out, or the transport failed
    #[error("Backend network error: {0}")]
    BackendNetwork(String),

    /// Backend answered with an error status or an unusable body
    #[error("Backend error: {0}")]
    Backend(String),

    /// An item could not be embedded, or the backend returned a malformed vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document extraction and document store errors
    #[error("Document error: {0}")]
    Document(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a second attempt at the same call could succeed.
    ///
    /// Network failures and backend errors are retryable; credential,
    /// configuration and data errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::BackendNetwork(_) | AppError::Backend(_))
    }

    /// Classify a non-success HTTP status from a backend.
    pub fn from_status(backend: &str, status: u16, body: &str) -> Self {
        let message = format!("{} returned HTTP {}: {}", backend, status, body.trim());
        match status {
            401 | 403 => AppError::BackendAuth(message),
            _ => AppError::Backend(message),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
