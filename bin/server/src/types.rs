//! Request and response bodies for the JSON API.

use crate::db::{DocumentRecord, DocumentStatus, StackRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackloom_core::{DocumentId, StackId};
use stackloom_workflow::{ContextPayload, WorkflowGraph};

/// Body for creating a stack.
#[derive(Debug, Deserialize)]
pub struct CreateStackRequest {
    /// Stack name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A stack as returned by the API.
#[derive(Debug, Serialize)]
pub struct StackResponse {
    /// Stack ID.
    pub id: StackId,
    /// Stack name.
    pub name: String,
    /// Description, if any.
    pub description: Option<String>,
    /// The persisted workflow graph, if one has been saved.
    pub workflow: Option<serde_json::Value>,
    /// When created.
    pub created_at: DateTime<Utc>,
    /// When last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<StackRecord> for StackResponse {
    fn from(record: StackRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            workflow: record.workflow_data,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A stack with its documents, returned by the detail endpoint.
#[derive(Debug, Serialize)]
pub struct StackDetailResponse {
    /// The stack itself.
    #[serde(flatten)]
    pub stack: StackResponse,
    /// Documents uploaded to this stack.
    pub documents: Vec<DocumentResponse>,
}

/// Body for replacing a stack's workflow.
///
/// The graph deserializes through the workflow model, which tolerates
/// unknown node kinds and re-serializes to the identical wire shape.
#[derive(Debug, Deserialize)]
pub struct UpdateWorkflowRequest {
    /// The workflow graph to validate and persist.
    pub workflow: WorkflowGraph,
}

/// A document as returned by the API.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document ID.
    pub id: DocumentId,
    /// The stack it belongs to.
    pub stack_id: StackId,
    /// Original filename.
    pub filename: String,
    /// Ingestion status.
    pub status: DocumentStatus,
    /// When uploaded.
    pub uploaded_at: DateTime<Utc>,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            stack_id: record.stack_id,
            filename: record.filename,
            status: record.status,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Body for a chat request: the graph to execute plus the user's query.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The workflow graph, as currently shown in the authoring client.
    pub workflow: WorkflowGraph,
    /// The user's query.
    pub query: String,
}

/// Body of a chat response.
///
/// The payload serializes untagged: a plain string for a completed chain, or
/// a `{"query", "context"}` object when the chain ended on a retrieval node.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The final context payload.
    pub response: ContextPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_response_renders_text_payload_as_string() {
        let body = ChatResponse {
            response: ContextPayload::text("an answer"),
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({"response": "an answer"})
        );
    }

    #[test]
    fn chat_response_renders_structured_payload_as_object() {
        let body = ChatResponse {
            response: ContextPayload::with_context("q", "c"),
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({"response": {"query": "q", "context": "c"}})
        );
    }

    #[test]
    fn chat_request_parses_wire_graph() {
        let request: ChatRequest = serde_json::from_value(json!({
            "query": "hello",
            "workflow": {
                "nodes": [
                    {"id": "1", "type": "userQuery", "data": {}},
                    {"id": "2", "type": "output", "data": {}}
                ],
                "edges": [{"source": "1", "target": "2"}]
            }
        }))
        .expect("deserialize");
        assert_eq!(request.query, "hello");
        assert_eq!(request.workflow.node_count(), 2);
    }

    #[test]
    fn update_request_preserves_unknown_kinds() {
        let raw = json!({
            "workflow": {
                "nodes": [{"id": "1", "type": "someFutureKind", "data": {"x": 1}}],
                "edges": []
            }
        });
        let request: UpdateWorkflowRequest =
            serde_json::from_value(raw.clone()).expect("deserialize");
        let reserialized = serde_json::to_value(&request.workflow).expect("serialize");
        assert_eq!(reserialized, raw["workflow"]);
    }
}
