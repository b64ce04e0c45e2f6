//! error.rs — API-level error taxonomy and its HTTP mapping.
//!
//! Handlers return `Result<_, ApiError>`; the `IntoResponse` impl turns each
//! variant into a `{"detail": ...}` JSON body with the matching status code.
//! Auth endpoints use their own `{"status": 0, "error": ...}` envelope and
//! build those responses inline instead of going through this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<crate::recommend::scoring::ScoreError> for ApiError {
    fn from(err: crate::recommend::scoring::ScoreError) -> Self {
        ApiError::Validation(err.to_string())
    }
}
