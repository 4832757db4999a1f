//! Database repository for knowledge-base documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use stackloom_core::{DocumentId, StackId};
use std::fmt;
use std::str::FromStr;

/// Ingestion status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Uploaded, ingestion not yet started.
    Uploaded,
    /// Ingestion in progress. A document stuck here means ingestion failed;
    /// re-uploading is the recovery path.
    Processing,
    /// Ingested; its chunks are searchable.
    Processed,
}

impl DocumentStatus {
    /// Returns the stored representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Processed => "processed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            other => Err(format!("unknown document status '{other}'")),
        }
    }
}

/// A document record from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document ID.
    pub id: DocumentId,
    /// The stack this document belongs to.
    pub stack_id: StackId,
    /// Original filename as uploaded.
    pub filename: String,
    /// Ingestion status.
    pub status: DocumentStatus,
    /// When uploaded.
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Creates a record for a freshly uploaded document, already queued for
    /// ingestion.
    #[must_use]
    pub fn new(stack_id: StackId, filename: String) -> Self {
        Self {
            id: DocumentId::new(),
            stack_id,
            filename,
            status: DocumentStatus::Processing,
            uploaded_at: Utc::now(),
        }
    }
}

/// Row type for document queries.
#[derive(FromRow)]
struct DocumentRow {
    id: String,
    stack_id: String,
    filename: String,
    status: String,
    uploaded_at: DateTime<Utc>,
}

impl DocumentRow {
    fn try_into_record(self) -> Result<DocumentRecord, sqlx::Error> {
        let id = DocumentId::from_str(&self.id).map_err(|e| decode_error(&self.id, &e))?;
        let stack_id =
            StackId::from_str(&self.stack_id).map_err(|e| decode_error(&self.stack_id, &e))?;
        let status =
            DocumentStatus::from_str(&self.status).map_err(|e| decode_error(&self.status, &e))?;

        Ok(DocumentRecord {
            id,
            stack_id,
            filename: self.filename,
            status,
            uploaded_at: self.uploaded_at,
        })
    }
}

fn decode_error(value: &str, reason: &dyn fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid value '{value}': {reason}"),
    )))
}

/// Repository for document operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new document record.
    pub async fn create(&self, document: &DocumentRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, stack_id, filename, status, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(document.id.to_string())
        .bind(document.stack_id.to_string())
        .bind(&document.filename)
        .bind(document.status.as_str())
        .bind(document.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists documents for a stack, most recent first.
    pub async fn list_by_stack(
        &self,
        stack_id: StackId,
    ) -> Result<Vec<DocumentRecord>, sqlx::Error> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, stack_id, filename, status, uploaded_at
            FROM documents
            WHERE stack_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(stack_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into_record()).collect()
    }

    /// Updates a document's ingestion status.
    pub async fn set_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE documents
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
