//! Document ingestion pipeline.
//!
//! Extract text, chunk, embed the chunks in one batch, persist. Ingestion is
//! asynchronous relative to chat executions: a retrieval issued while a
//! document is still being ingested sees whatever chunks have landed so far,
//! which may be none. That gap is inherent and tolerated, not an error.

use crate::chunker::{DEFAULT_CHUNK_SIZE, chunk_text};
use crate::error::KnowledgeError;
use crate::store::{ChunkRecord, ChunkStore};
use stackloom_ai::GeminiEmbeddings;
use stackloom_core::{DocumentId, StackId};
use tracing::info;

/// Ingests uploaded documents into a stack's knowledge base.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    embeddings: GeminiEmbeddings,
    store: ChunkStore,
    chunk_size: usize,
}

impl DocumentIngestor {
    /// Creates an ingestor with the default chunk size.
    #[must_use]
    pub fn new(embeddings: GeminiEmbeddings, store: ChunkStore) -> Self {
        Self {
            embeddings,
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the chunk size (tests).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Ingests one document, replacing any chunks from a previous upload of
    /// the same document id. Returns the number of chunks stored.
    ///
    /// # Errors
    ///
    /// Returns [`KnowledgeError`] when the document has no extractable text,
    /// embedding fails, or the store fails. The caller decides what a failed
    /// ingestion means for the document's status.
    pub async fn ingest(
        &self,
        stack_id: StackId,
        document_id: DocumentId,
        bytes: &[u8],
        embedding_model: &str,
        api_key: Option<&str>,
    ) -> Result<usize, KnowledgeError> {
        let text = extract_text(bytes);
        if text.trim().is_empty() {
            return Err(KnowledgeError::EmptyDocument);
        }

        let chunks = chunk_text(&text, self.chunk_size);
        info!(
            %stack_id,
            %document_id,
            characters = text.chars().count(),
            chunks = chunks.len(),
            "ingesting document"
        );

        let embeddings = self
            .embeddings
            .embed_documents(embedding_model, &chunks, api_key)
            .await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(seq, (content, embedding))| {
                ChunkRecord::new(stack_id, document_id, seq as i32, content, embedding)
            })
            .collect();

        self.store.delete_for_document(document_id).await?;
        self.store.insert_chunks(&records).await?;

        info!(%stack_id, %document_id, chunks = records.len(), "document ingested");
        Ok(records.len())
    }
}

/// Extracts text from an uploaded document body.
///
/// Uploads are text-based (plain text, markdown); invalid UTF-8 sequences
/// are replaced rather than rejected. Binary formats plug in here.
fn extract_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_passes_utf8_through() {
        assert_eq!(extract_text(b"plain text"), "plain text");
    }

    #[test]
    fn extract_text_replaces_invalid_sequences() {
        let text = extract_text(&[0x68, 0x69, 0xFF]);
        assert!(text.starts_with("hi"));
    }
}
