//! Error types for the knowledge crate.

use stackloom_ai::EmbeddingError;
use std::fmt;

/// Errors from ingestion or retrieval.
#[derive(Debug)]
pub enum KnowledgeError {
    /// The uploaded document contained no extractable text.
    EmptyDocument,
    /// Embedding generation failed.
    Embedding(EmbeddingError),
    /// The chunk store failed.
    Store(sqlx::Error),
}

impl fmt::Display for KnowledgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "document contains no extractable text"),
            Self::Embedding(error) => write!(f, "embedding generation failed: {error}"),
            Self::Store(error) => write!(f, "chunk store operation failed: {error}"),
        }
    }
}

impl std::error::Error for KnowledgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EmptyDocument => None,
            Self::Embedding(error) => Some(error),
            Self::Store(error) => Some(error),
        }
    }
}

impl From<EmbeddingError> for KnowledgeError {
    fn from(error: EmbeddingError) -> Self {
        Self::Embedding(error)
    }
}

impl From<sqlx::Error> for KnowledgeError {
    fn from(error: sqlx::Error) -> Self {
        Self::Store(error)
    }
}
