//! Postgres-backed chunk store.
//!
//! Each row is one chunk of one document: its text plus its embedding,
//! stored as little-endian `f32` bytes. Retrieval loads a stack's chunks and
//! ranks them in process; stacks are small enough that shipping the vectors
//! to the database would buy nothing.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use stackloom_ai::cosine_similarity;
use stackloom_core::{DocumentId, StackId};

/// One stored chunk with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    /// Chunk row id.
    pub id: String,
    /// The stack this chunk belongs to.
    pub stack_id: StackId,
    /// The document this chunk came from.
    pub document_id: DocumentId,
    /// Position of this chunk within its document.
    pub seq: i32,
    /// The chunk text.
    pub content: String,
    /// The chunk embedding.
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    /// Creates a record for a freshly embedded chunk.
    #[must_use]
    pub fn new(
        stack_id: StackId,
        document_id: DocumentId,
        seq: i32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            stack_id,
            document_id,
            seq,
            content,
            embedding,
        }
    }
}

/// Encodes an embedding as little-endian `f32` bytes.
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes little-endian `f32` bytes back into an embedding.
///
/// Trailing bytes that do not form a full `f32` are dropped.
#[must_use]
pub fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Ranks `chunks` against a query embedding, returning the `top_k` chunk
/// texts in descending similarity order.
#[must_use]
pub fn rank_chunks(query_embedding: &[f32], chunks: &[ChunkRecord], top_k: usize) -> Vec<String> {
    let mut scored: Vec<(f32, &ChunkRecord)> = chunks
        .iter()
        .map(|chunk| (cosine_similarity(query_embedding, &chunk.embedding), chunk))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(top_k)
        .map(|(_, chunk)| chunk.content.clone())
        .collect()
}

/// Row type for chunk queries.
#[derive(FromRow)]
struct ChunkRow {
    id: String,
    stack_id: String,
    document_id: String,
    seq: i32,
    content: String,
    embedding: Vec<u8>,
}

impl ChunkRow {
    fn try_into_record(self) -> Result<ChunkRecord, sqlx::Error> {
        let stack_id: StackId = self.stack_id.parse().map_err(|e| {
            sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid stack id '{}': {}", self.stack_id, e),
            )))
        })?;
        let document_id: DocumentId = self.document_id.parse().map_err(|e| {
            sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid document id '{}': {}", self.document_id, e),
            )))
        })?;

        Ok(ChunkRecord {
            id: self.id,
            stack_id,
            document_id,
            seq: self.seq,
            content: self.content,
            embedding: decode_embedding(&self.embedding),
        })
    }
}

/// Repository for chunk operations.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    pool: PgPool,
}

impl ChunkStore {
    /// Creates a new store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts chunks for a document.
    pub async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> Result<(), sqlx::Error> {
        let now: DateTime<Utc> = Utc::now();
        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO document_chunks
                    (id, stack_id, document_id, seq, content, embedding, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&chunk.id)
            .bind(chunk.stack_id.to_string())
            .bind(chunk.document_id.to_string())
            .bind(chunk.seq)
            .bind(&chunk.content)
            .bind(encode_embedding(&chunk.embedding))
            .bind(now)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Deletes all chunks for a document (re-ingestion replaces them).
    pub async fn delete_for_document(&self, document_id: DocumentId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM document_chunks
            WHERE document_id = $1
            "#,
        )
        .bind(document_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads all chunks for a stack, in document/sequence order.
    pub async fn chunks_for_stack(
        &self,
        stack_id: StackId,
    ) -> Result<Vec<ChunkRecord>, sqlx::Error> {
        let rows: Vec<ChunkRow> = sqlx::query_as(
            r#"
            SELECT id, stack_id, document_id, seq, content, embedding
            FROM document_chunks
            WHERE stack_id = $1
            ORDER BY document_id, seq
            "#,
        )
        .bind(stack_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into_record()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_roundtrip() {
        let embedding = vec![0.1_f32, -2.5, 1e-8, 42.0];
        let bytes = encode_embedding(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_embedding(&bytes), embedding);
    }

    #[test]
    fn decode_drops_trailing_partial_float() {
        let mut bytes = encode_embedding(&[1.0]);
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        assert_eq!(decode_embedding(&bytes), vec![1.0]);
    }

    fn record(content: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(StackId::new(), DocumentId::new(), 0, content.to_owned(), embedding)
    }

    #[test]
    fn ranking_orders_by_similarity() {
        let chunks = vec![
            record("orthogonal", vec![0.0, 1.0]),
            record("exact", vec![1.0, 0.0]),
            record("close", vec![0.9, 0.1]),
        ];
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 2);
        assert_eq!(ranked, vec!["exact", "close"]);
    }

    #[test]
    fn ranking_handles_fewer_chunks_than_k() {
        let chunks = vec![record("only", vec![1.0, 0.0])];
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 3);
        assert_eq!(ranked, vec!["only"]);
    }

    #[test]
    fn ranking_of_empty_store_is_empty() {
        assert!(rank_chunks(&[1.0], &[], 3).is_empty());
    }

    #[test]
    fn malformed_embedding_ranks_last() {
        let chunks = vec![
            record("bad", vec![]),
            record("good", vec![1.0, 0.0]),
        ];
        let ranked = rank_chunks(&[1.0, 0.0], &chunks, 2);
        assert_eq!(ranked, vec!["good", "bad"]);
    }
}
