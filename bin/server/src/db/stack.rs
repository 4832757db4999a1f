//! Database repository for stacks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use stackloom_core::StackId;
use std::str::FromStr;

/// A stack record from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRecord {
    /// Stack ID.
    pub id: StackId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// The persisted workflow graph, if one has been saved.
    pub workflow_data: Option<serde_json::Value>,
    /// When created.
    pub created_at: DateTime<Utc>,
    /// When last updated.
    pub updated_at: DateTime<Utc>,
}

impl StackRecord {
    /// Creates a new stack record with no workflow yet.
    #[must_use]
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: StackId::new(),
            name,
            description,
            workflow_data: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Row type for stack queries.
#[derive(FromRow)]
struct StackRow {
    id: String,
    name: String,
    description: Option<String>,
    workflow_data: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StackRow {
    fn try_into_record(self) -> Result<StackRecord, sqlx::Error> {
        let id = StackId::from_str(&self.id).map_err(|e| {
            sqlx::Error::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid stack id '{}': {}", self.id, e),
            )))
        })?;

        Ok(StackRecord {
            id,
            name: self.name,
            description: self.description,
            workflow_data: self.workflow_data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for stack operations.
#[derive(Debug, Clone)]
pub struct StackRepository {
    pool: PgPool,
}

impl StackRepository {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new stack.
    pub async fn create(&self, stack: &StackRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO stacks (id, name, description, workflow_data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(stack.id.to_string())
        .bind(&stack.name)
        .bind(&stack.description)
        .bind(&stack.workflow_data)
        .bind(stack.created_at)
        .bind(stack.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists all stacks, most recently updated first.
    pub async fn list(&self) -> Result<Vec<StackRecord>, sqlx::Error> {
        let rows: Vec<StackRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, workflow_data, created_at, updated_at
            FROM stacks
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into_record()).collect()
    }

    /// Finds a stack by ID.
    pub async fn find_by_id(&self, id: StackId) -> Result<Option<StackRecord>, sqlx::Error> {
        let row: Option<StackRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, workflow_data, created_at, updated_at
            FROM stacks
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }

    /// Replaces a stack's workflow graph, returning the updated record.
    ///
    /// Returns `None` when no stack with that id exists.
    pub async fn update_workflow(
        &self,
        id: StackId,
        workflow_data: serde_json::Value,
    ) -> Result<Option<StackRecord>, sqlx::Error> {
        let row: Option<StackRow> = sqlx::query_as(
            r#"
            UPDATE stacks
            SET workflow_data = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, workflow_data, created_at, updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(workflow_data)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }
}
