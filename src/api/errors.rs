//! API error types and HTTP status mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::scheduler::SchedulerError;
use crate::storage::StorageError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Invalid request (e.g., failed validation, wrong record state).
    BadRequest(String),
    /// Request conflict (e.g., duplicate record code).
    Conflict(String),
    /// Upstream payment service rejected or was unreachable.
    BadGateway(String),
    /// Service unavailable (e.g., scheduler not running).
    ServiceUnavailable(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::TransactionNotFound(code) => {
                ApiError::NotFound(format!("transaction not found: {}", code))
            }
            SchedulerError::InvalidState(code) => {
                ApiError::BadRequest(format!("transaction {} is not active", code))
            }
            SchedulerError::Expired(code) => {
                ApiError::BadRequest(format!("transaction {} is past its end date", code))
            }
            SchedulerError::Submit(e) => ApiError::BadGateway(e.to_string()),
            SchedulerError::Storage(e) => e.into(),
            SchedulerError::ChannelError(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            StorageError::DuplicateCode(msg) => {
                ApiError::Conflict(format!("duplicate code: {}", msg))
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
