//! Shared application state.

use crate::config::ServerConfig;
use crate::db::{DocumentRepository, StackRepository};
use sqlx::PgPool;
use stackloom_ai::{GeminiBackend, GeminiEmbeddings, SerpApiClient};
use stackloom_knowledge::{ChunkStore, DocumentIngestor, KnowledgeIndex};
use stackloom_workflow::WorkflowExecutor;
use std::sync::Arc;

/// Everything the request handlers need, constructed once at startup.
///
/// Collaborator clients are built here and injected into the executor,
/// scoped to the lifetime of the server rather than held in globals.
#[derive(Clone)]
pub struct AppState {
    /// Stack repository.
    pub stacks: StackRepository,
    /// Document repository.
    pub documents: DocumentRepository,
    /// The workflow execution engine.
    pub executor: WorkflowExecutor,
    /// Document ingestion pipeline.
    pub ingestor: DocumentIngestor,
}

impl AppState {
    /// Wires repositories, collaborator clients, and the executor.
    #[must_use]
    pub fn new(pool: PgPool, config: &ServerConfig) -> Self {
        let chunk_store = ChunkStore::new(pool.clone());
        let embeddings = GeminiEmbeddings::new(config.google_api_key.clone());

        let knowledge = KnowledgeIndex::new(embeddings.clone(), chunk_store.clone());
        let llm = GeminiBackend::new(config.google_api_key.clone());
        let web_search = SerpApiClient::new(config.serpapi_api_key.clone());

        Self {
            stacks: StackRepository::new(pool.clone()),
            documents: DocumentRepository::new(pool),
            executor: WorkflowExecutor::new(
                Arc::new(knowledge),
                Arc::new(llm),
                Arc::new(web_search),
            ),
            ingestor: DocumentIngestor::new(embeddings, chunk_store),
        }
    }
}
