//! Error types for the `mmsearch-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while embedding, storing, or searching documents.
#[derive(Debug, Error)]
pub enum MmSearchError {
    /// A filesystem operation failed.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        /// The path being read, written, or listed.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Stored image content was not valid base64.
    #[error("Failed to decode stored image content: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Persisted state could not be serialized or parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rendered results could not be written to the output stream.
    #[error("Failed to write results: {0}")]
    Output(#[source] std::io::Error),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MmSearchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// A convenience result type for multimodal search operations.
pub type Result<T> = std::result::Result<T, MmSearchError>;
