//! API error responses.
//!
//! Every error renders as `{"detail": "..."}` with the appropriate status
//! code, which is what the graph-authoring client expects. Internal details
//! are logged, not leaked.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use tracing::error;

/// An error surfaced to an API client.
#[derive(Debug)]
pub enum ApiError {
    /// The requested resource does not exist.
    NotFound(&'static str),
    /// The request was malformed.
    BadRequest(String),
    /// The submitted workflow failed structural validation. The message is
    /// the validator's caller-visible detail text.
    Validation(String),
    /// Something failed on our side.
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::BadRequest(detail) => write!(f, "bad request: {detail}"),
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(reason) => {
                error!(%reason, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
