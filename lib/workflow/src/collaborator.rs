//! Interfaces to the services node handlers call out to.
//!
//! The executor consumes these traits but never implements them; concrete
//! clients live in the ai and knowledge crates and are injected per
//! [`WorkflowExecutor`](crate::executor::WorkflowExecutor), scoped to the
//! lifetime of the surrounding service rather than held in process-wide
//! globals.
//!
//! All three contracts are failure-absorbing at the executor boundary: an
//! `Err` is logged and replaced with degraded text, so a chat request always
//! receives an answer.

use crate::error::CollaboratorError;
use async_trait::async_trait;
use stackloom_core::StackId;

/// Semantic retrieval over a stack's knowledge base.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Retrieves context for `query` from the given stack's index.
    ///
    /// Returns the top-ranked chunk texts joined with newlines. An empty
    /// string is a valid result: the index may not exist yet, or ingestion of
    /// a just-uploaded document may still be running.
    async fn retrieve(
        &self,
        stack_id: StackId,
        query: &str,
        embedding_model: &str,
        api_key: Option<&str>,
    ) -> Result<String, CollaboratorError>;
}

/// Single-shot language-model inference.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a response for the fully rendered prompt.
    ///
    /// `api_key` is a per-node override; implementations fall back to their
    /// configured key when it is absent.
    async fn generate(
        &self,
        prompt: &str,
        api_key: Option<&str>,
        model_name: &str,
        temperature: f32,
    ) -> Result<String, CollaboratorError>;
}

/// Web search for recent information.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Returns snippet text for `query`.
    ///
    /// Missing-key and empty-result conditions are `Ok` with a fixed status
    /// string; `Err` is reserved for transport or provider failures.
    async fn search(&self, query: &str) -> Result<String, CollaboratorError>;
}
