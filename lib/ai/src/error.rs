//! Error types for the AI crate.

use std::fmt;

/// Errors from language-model inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No API key was configured and the node supplied none.
    MissingApiKey,
    /// The HTTP request failed or the provider returned a non-success status.
    RequestFailed {
        /// What went wrong.
        reason: String,
    },
    /// The provider's response could not be interpreted.
    ResponseParseFailed {
        /// What went wrong.
        reason: String,
    },
    /// The provider returned no candidates.
    EmptyResponse,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "no API key configured for the language model"),
            Self::RequestFailed { reason } => write!(f, "LLM request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse LLM response: {reason}")
            }
            Self::EmptyResponse => write!(f, "LLM returned no candidates"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Errors from embedding generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// No API key was configured and the caller supplied none.
    MissingApiKey,
    /// The HTTP request failed or the provider returned a non-success status.
    RequestFailed {
        /// What went wrong.
        reason: String,
    },
    /// The provider's response could not be interpreted.
    ResponseParseFailed {
        /// What went wrong.
        reason: String,
    },
    /// The provider returned a different number of embeddings than inputs.
    CountMismatch {
        /// How many inputs were sent.
        expected: usize,
        /// How many embeddings came back.
        received: usize,
    },
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "no API key configured for embeddings"),
            Self::RequestFailed { reason } => write!(f, "embedding request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse embedding response: {reason}")
            }
            Self::CountMismatch { expected, received } => {
                write!(f, "expected {expected} embeddings, received {received}")
            }
        }
    }
}

impl std::error::Error for EmbeddingError {}

/// Errors from web search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The HTTP request failed or the provider returned a non-success status.
    RequestFailed {
        /// What went wrong.
        reason: String,
    },
    /// The provider's response could not be interpreted.
    ResponseParseFailed {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "web search request failed: {reason}"),
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse web search response: {reason}")
            }
        }
    }
}

impl std::error::Error for SearchError {}
