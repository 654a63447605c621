//! Error types returned by the user service and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::RepositoryError;
use crate::services::FieldErrors;

/// Which unique field a write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Email already exists")]
    Email,
    #[error("Phone number already exists")]
    Phone,
}

/// Outcome of a failed user service operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error(transparent)]
    Conflict(#[from] Conflict),
    #[error("Not found")]
    NotFound,
    /// Storage or runtime fault. The message reaches the caller verbatim.
    #[error("{0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate(conflict) => Self::Conflict(conflict),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Errors produced by the HTTP layer in front of the service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("{0}")]
    MalformedBody(String),
}

pub(crate) fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Self::Conflict(conflict) => error_body(StatusCode::BAD_REQUEST, conflict.to_string()),
            Self::NotFound => error_body(StatusCode::NOT_FOUND, "Not found"),
            Self::Internal(message) => {
                error!(%message, "user operation failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Service(error) => error.into_response(),
            Self::MalformedBody(message) => error_body(StatusCode::BAD_REQUEST, message),
        }
    }
}
