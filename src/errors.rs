//! Error types for the deskpilot agent
//!
//! Every pipeline step reports failures through [`DeskError`]; the
//! orchestrator captures them into the request state instead of letting
//! them escape a run.

use thiserror::Error;

/// Main error type for the deskpilot pipeline
#[derive(Error, Debug)]
pub enum DeskError {
    /// The classification capability could not produce a well-formed verdict
    #[error("classification failed for message {message:?}: {reason}")]
    ClassificationFailure { message: String, reason: String },

    /// Retrieval was attempted against an unbuilt or empty index
    #[error("document index has not been built")]
    IndexNotReady,

    /// Similarity search errors
    #[error("retrieval failed: {0}")]
    RetrievalFailure(String),

    /// Generative completion errors
    #[error("completion failed: {0}")]
    CompletionFailure(String),

    /// Embedding capability errors
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// Required configuration is absent (caught before orchestration starts)
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Corpus ingestion errors
    #[error("corpus error: {0}")]
    CorpusError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for deskpilot operations
pub type Result<T> = std::result::Result<T, DeskError>;

impl DeskError {
    /// Build a classification failure that keeps the original message
    pub fn classification(message: impl Into<String>, reason: impl Into<String>) -> Self {
        DeskError::ClassificationFailure {
            message: message.into(),
            reason: reason.into(),
        }
    }
}

impl From<candle_core::Error> for DeskError {
    fn from(err: candle_core::Error) -> Self {
        DeskError::EmbeddingFailure(err.to_string())
    }
}
