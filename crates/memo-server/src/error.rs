use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use memo_core::MemoError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Memo not found
    #[error("memo not found: {0}")]
    NotFound(String),

    /// Invalid input, including a missing identity header
    #[error("{0}")]
    BadRequest(String),

    /// Storage or other internal failure
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl From<MemoError> for AppError {
    fn from(err: MemoError) -> Self {
        match err {
            MemoError::NotFound { id } => AppError::NotFound(id),
            MemoError::ValidationFailed { .. } | MemoError::InvalidTransition { .. } => {
                AppError::BadRequest(err.to_string())
            },
            MemoError::Persistence { .. } => {
                tracing::error!(error = %err, "Store operation failed");
                AppError::Internal(err.to_string())
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
