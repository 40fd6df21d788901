//! API error types and error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use policy_qa_matcher::MatchError;
use policy_qa_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Failure while answering a single question
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Fact extraction failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Retrieval fallback failed: {0}")]
    Fallback(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        ApiError::Evaluation(err.to_string())
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Match(e) => e.into(),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Evaluation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "evaluation_error"),
            ApiError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
