//! Error types for the pdfops server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfops_core::PdfOpsError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    MissingInput(String),

    #[error("Invalid form submission: {0}")]
    InvalidForm(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] MultipartError),

    #[error("Invalid password for PDF file.")]
    Unauthorized,

    #[error("{0}")]
    Processing(String),

    #[error("Processing timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::UnsupportedMediaType(msg) => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            ApiError::MissingInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_INPUT",
                msg.clone(),
            ),
            ApiError::InvalidForm(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_FORM",
                msg.clone(),
            ),
            ApiError::Upload(e) => (e.status(), "UPLOAD_FAILED", e.body_text()),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "INVALID_PASSWORD",
                self.to_string(),
            ),
            ApiError::Processing(msg) => {
                (StatusCode::BAD_REQUEST, "PROCESSING_FAILED", msg.clone())
            }
            ApiError::Timeout(ms) => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                format!("Processing timeout after {}ms", ms),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PdfOpsError> for ApiError {
    fn from(err: PdfOpsError) -> Self {
        match err {
            PdfOpsError::InvalidPassword => ApiError::Unauthorized,
            PdfOpsError::NoImages => ApiError::MissingInput(err.to_string()),
            other => ApiError::Processing(other.to_string()),
        }
    }
}
