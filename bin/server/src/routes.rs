//! Request handlers and router assembly.
//!
//! Two of these endpoints are the workflow core's call sites:
//!
//! - `PUT /stacks/{id}`: validate-before-persist. A failed validation is a
//!   400 whose detail is the validator's message; the graph is only saved
//!   when it passes.
//! - `POST /stacks/{id}/chat`: execute-on-chat. The graph ships with the
//!   request, is executed as-is, and the caller always receives a response
//!   body — execution-time problems become the response text.

use crate::db::{DocumentRecord, DocumentStatus, StackRecord};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{
    ChatRequest, ChatResponse, CreateStackRequest, DocumentResponse, StackDetailResponse,
    StackResponse, UpdateWorkflowRequest,
};
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stackloom_core::StackId;
use stackloom_workflow::node::DEFAULT_EMBEDDING_MODEL;
use stackloom_workflow::{ContextPayload, validate};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/stacks", post(create_stack).get(list_stacks))
        .route("/stacks/{stack_id}", get(get_stack).put(update_stack))
        .route(
            "/stacks/{stack_id}/documents",
            post(upload_document).get(list_documents),
        )
        .route("/stacks/{stack_id}/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API is running",
    })
}

async fn create_stack(
    State(state): State<AppState>,
    Json(request): Json<CreateStackRequest>,
) -> Result<Json<StackResponse>, ApiError> {
    let record = StackRecord::new(request.name, request.description);
    state.stacks.create(&record).await?;
    info!(stack_id = %record.id, name = %record.name, "created stack");
    Ok(Json(record.into()))
}

async fn list_stacks(
    State(state): State<AppState>,
) -> Result<Json<Vec<StackResponse>>, ApiError> {
    let stacks = state.stacks.list().await?;
    Ok(Json(stacks.into_iter().map(StackResponse::from).collect()))
}

async fn get_stack(
    State(state): State<AppState>,
    Path(stack_id): Path<StackId>,
) -> Result<Json<StackDetailResponse>, ApiError> {
    let stack = state
        .stacks
        .find_by_id(stack_id)
        .await?
        .ok_or(ApiError::NotFound("Stack"))?;
    let documents = state.documents.list_by_stack(stack_id).await?;

    Ok(Json(StackDetailResponse {
        stack: stack.into(),
        documents: documents.into_iter().map(DocumentResponse::from).collect(),
    }))
}

async fn update_stack(
    State(state): State<AppState>,
    Path(stack_id): Path<StackId>,
    Json(request): Json<UpdateWorkflowRequest>,
) -> Result<Json<StackResponse>, ApiError> {
    let outcome = validate(&request.workflow);
    if !outcome.valid {
        return Err(ApiError::Validation(outcome.message));
    }

    let graph_json = serde_json::to_value(&request.workflow)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let updated = state
        .stacks
        .update_workflow(stack_id, graph_json)
        .await?
        .ok_or(ApiError::NotFound("Stack"))?;

    info!(%stack_id, "persisted workflow");
    Ok(Json(updated.into()))
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    embedding_model: Option<String>,
    api_key: Option<String>,
}

async fn upload_document(
    State(state): State<AppState>,
    Path(stack_id): Path<StackId>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    state
        .stacks
        .find_by_id(stack_id)
        .await?
        .ok_or(ApiError::NotFound("Stack"))?;

    let mut filename = None;
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_owned);
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            );
        }
    }
    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;

    let record = DocumentRecord::new(
        stack_id,
        filename.unwrap_or_else(|| "document.txt".to_string()),
    );
    state.documents.create(&record).await?;
    info!(%stack_id, document_id = %record.id, filename = %record.filename, "queued document for ingestion");

    // Ingestion runs in the background; retrieval against this stack may see
    // partial or no chunks until it finishes.
    let ingestor = state.ingestor.clone();
    let documents = state.documents.clone();
    let document_id = record.id;
    let embedding_model = resolve_embedding_model(params.embedding_model.as_deref()).to_owned();
    let api_key = params.api_key;
    tokio::spawn(async move {
        match ingestor
            .ingest(
                stack_id,
                document_id,
                &bytes,
                &embedding_model,
                api_key.as_deref(),
            )
            .await
        {
            Ok(chunks) => {
                info!(%document_id, chunks, "ingestion complete");
                if let Err(e) = documents
                    .set_status(document_id, DocumentStatus::Processed)
                    .await
                {
                    error!(%document_id, error = %e, "failed to mark document processed");
                }
            }
            Err(e) => {
                // The document stays in `processing`; re-uploading retries.
                error!(%document_id, error = %e, "ingestion failed");
            }
        }
    });

    Ok(Json(record.into()))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(stack_id): Path<StackId>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let documents = state.documents.list_by_stack(stack_id).await?;
    Ok(Json(
        documents.into_iter().map(DocumentResponse::from).collect(),
    ))
}

async fn chat(
    State(state): State<AppState>,
    Path(stack_id): Path<StackId>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = match state
        .executor
        .execute(&request.workflow, stack_id, &request.query)
        .await
    {
        Ok(payload) => payload,
        Err(error) => {
            // The chat surface always answers; the error's display text is
            // the caller-visible reply.
            warn!(%stack_id, %error, "workflow execution failed");
            ContextPayload::text(error.to_string())
        }
    };

    Json(ChatResponse { response })
}

/// Applies the default embedding model, including the authoring client's
/// `"undefined"` sentinel.
fn resolve_embedding_model(raw: Option<&str>) -> &str {
    match raw {
        None | Some("") | Some("undefined") => DEFAULT_EMBEDDING_MODEL,
        Some(model) => model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_model_sentinel_maps_to_default() {
        assert_eq!(resolve_embedding_model(None), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(
            resolve_embedding_model(Some("undefined")),
            DEFAULT_EMBEDDING_MODEL
        );
        assert_eq!(resolve_embedding_model(Some("")), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(
            resolve_embedding_model(Some("models/text-embedding-004")),
            "models/text-embedding-004"
        );
    }
}
