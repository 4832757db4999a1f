//! AI collaborator clients for the stackloom platform.
//!
//! This crate implements the collaborator traits the workflow executor
//! consumes:
//!
//! - **[`GeminiBackend`]**: chat inference over the Generative Language API
//! - **[`GeminiEmbeddings`]**: document and query embeddings, plus the cosine
//!   ranking helper the knowledge layer builds on
//! - **[`SerpApiClient`]**: web-search snippets
//!
//! All clients degrade rather than escalate: callers receive typed errors,
//! and the executor's failure-absorbing boundary turns those into fallback
//! text for the end user.

pub mod backend;
pub mod embeddings;
pub mod error;
pub mod web_search;

pub use backend::GeminiBackend;
pub use embeddings::{EmbeddingTaskType, GeminiEmbeddings, cosine_similarity};
pub use error::{EmbeddingError, LlmError, SearchError};
pub use web_search::SerpApiClient;
