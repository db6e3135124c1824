//! Error types for revdash-api

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
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// A required credential or setting is missing (500)
    #[error("{0}")]
    NotConfigured(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// revdash-common error
    #[error("{0}")]
    Common(#[from] revdash_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use revdash_common::Error as CommonError;

        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotConfigured(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(CommonError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(CommonError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "status": "error",
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
