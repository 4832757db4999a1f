//! Semantic retrieval over a stack's stored chunks.

use crate::store::{ChunkStore, rank_chunks};
use async_trait::async_trait;
use stackloom_ai::GeminiEmbeddings;
use stackloom_core::StackId;
use stackloom_workflow::{CollaboratorError, KnowledgeSearch};
use tracing::debug;

/// How many chunks contribute to the retrieved context by default.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieval index over the chunk store.
///
/// The query is embedded with the model the caller names — which must be the
/// model the stack's documents were embedded with — and stored chunks are
/// ranked by cosine similarity in process.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    embeddings: GeminiEmbeddings,
    store: ChunkStore,
    top_k: usize,
}

impl KnowledgeIndex {
    /// Creates an index with the default result count.
    #[must_use]
    pub fn new(embeddings: GeminiEmbeddings, store: ChunkStore) -> Self {
        Self {
            embeddings,
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Overrides how many chunks are returned.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[async_trait]
impl KnowledgeSearch for KnowledgeIndex {
    async fn retrieve(
        &self,
        stack_id: StackId,
        query: &str,
        embedding_model: &str,
        api_key: Option<&str>,
    ) -> Result<String, CollaboratorError> {
        let chunks = self
            .store
            .chunks_for_stack(stack_id)
            .await
            .map_err(|e| CollaboratorError::new(e.to_string()))?;

        // An empty index is a valid state: nothing uploaded yet, or
        // ingestion still running.
        if chunks.is_empty() {
            debug!(%stack_id, "no chunks stored, returning empty context");
            return Ok(String::new());
        }

        let query_embedding = self
            .embeddings
            .embed_query(embedding_model, query, api_key)
            .await
            .map_err(|e| CollaboratorError::new(e.to_string()))?;

        let ranked = rank_chunks(&query_embedding, &chunks, self.top_k);
        debug!(%stack_id, candidates = chunks.len(), returned = ranked.len(), "retrieved context");
        Ok(ranked.join("\n"))
    }
}
