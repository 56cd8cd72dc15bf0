//! Error types for rsa-demo HTTP handlers

use crate::workflow::WorkflowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Conflict (409), e.g. analysis already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream model failed (502)
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Model or dataset not loaded yet (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Settings store failure (500)
    #[error("Common error: {0}")]
    Common(#[from] rsa_common::Error),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::Busy => ApiError::Conflict(err.to_string()),
            WorkflowError::NotReady => ApiError::ServiceUnavailable(err.to_string()),
            WorkflowError::Classification(_) => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
