//! Error types for the Prensa server
//!
//! Maps engine errors onto HTTP responses. Conversion failures carry the
//! full per-backend diagnostic chain into the response body: callers must
//! never see a bare "internal error" for an exhausted fallback plan.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::ConvertError;
use crate::partition::{PartitionError, SelectionError};
use crate::pdfops::PdfOpError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfOpError),

    #[error("Partition error: {0}")]
    Partition(#[from] PartitionError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Archive error: {0}")]
    Archive(#[from] crate::archive::ArchiveError),

    #[error("Upload error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    /// Per-backend failure chain for exhausted conversions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attempts: Vec<AttemptInfo>,
}

#[derive(Serialize)]
struct AttemptInfo {
    backend: String,
    diagnostic: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut attempts = Vec::new();

        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Selection(e) => {
                (StatusCode::BAD_REQUEST, "invalid_selection", e.to_string())
            }
            AppError::Multipart(e) => {
                (StatusCode::BAD_REQUEST, "bad_upload", e.to_string())
            }
            AppError::Pdf(e) => {
                let status = match e {
                    PdfOpError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    PdfOpError::InvalidRotation(_) | PdfOpError::PageOutOfRange { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, "pdf_error", e.to_string())
            }
            AppError::Partition(e) => {
                tracing::error!("Partition error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial_write_failure",
                    e.to_string(),
                )
            }
            AppError::Convert(e) => match e {
                ConvertError::NoBackendAvailable { .. } => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no_backend_available",
                    e.to_string(),
                ),
                ConvertError::Exhausted {
                    attempts: attempted,
                } => {
                    attempts = attempted
                        .iter()
                        .map(|a| AttemptInfo {
                            backend: a.backend.to_string(),
                            diagnostic: a.diagnostic.clone(),
                        })
                        .collect();
                    (
                        StatusCode::BAD_GATEWAY,
                        "conversion_exhausted",
                        e.to_string(),
                    )
                }
            },
            AppError::Archive(e) => {
                tracing::error!("Archive error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "archive_error",
                    "Failed to package output".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "IO error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            attempts,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::AttemptFailure;

    #[test]
    fn selection_errors_are_bad_requests() {
        let response = AppError::Selection(SelectionError::ZeroStride).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn no_backend_is_service_unavailable() {
        let err = AppError::Convert(ConvertError::NoBackendAvailable {
            operation: "pdf to docx".to_string(),
            considered: vec!["soffice"],
        });
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn exhausted_is_bad_gateway() {
        let err = AppError::Convert(ConvertError::Exhausted {
            attempts: vec![AttemptFailure {
                backend: "ghostscript",
                diagnostic: "exited with code 1".to_string(),
            }],
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unparseable_upload_is_unprocessable() {
        let err = AppError::Pdf(PdfOpError::Parse("garbage".to_string()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
