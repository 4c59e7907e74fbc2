//! Error types for msub-export
//!
//! [`ExportError`] covers the package pipeline itself; [`ApiError`] maps
//! pipeline failures onto HTTP responses for the service layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Export pipeline error
#[derive(Debug, Error)]
pub enum ExportError {
    /// Submission has no stored manuscript file
    #[error("No manuscript file stored for submission")]
    NoManuscriptFile,

    /// More than one manuscript file reached package assembly
    #[error("More than one manuscript file present in package")]
    MultipleManuscriptFiles,

    /// Status write or load targeted an unknown submission id
    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    /// Person lookup failed during article generation; names the editor id
    #[error("Editor lookup failed for {id}: {reason}")]
    EditorLookup { id: String, reason: String },

    /// Callback handler could not persist the imported status
    #[error("Unable to update manuscript {0}")]
    UnableToUpdateManuscript(String),

    /// No transports configured; a package cannot go anywhere
    #[error("No delivery targets configured")]
    NoDeliveryTargets,

    /// Transport write failure
    #[error("Delivery via {kind} failed: {message}")]
    Delivery { kind: &'static str, message: String },

    /// File content could not be retrieved from the content store
    #[error("File content unavailable: {0}")]
    FileContent(String),

    /// XML artifact generation failure
    #[error("XML generation failed: {0}")]
    Xml(String),

    /// PDF artifact generation failure
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// ZIP assembly failure
    #[error("Archive write failed: {0}")]
    Archive(String),

    /// Transfer token signing failure
    #[error("Token signing failed: {0}")]
    Token(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// msub-common error
    #[error("Common error: {0}")]
    Common(#[from] msub_common::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Export pipeline failure, mapped per variant
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Export(err) => export_error_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
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

fn export_error_response(err: ExportError) -> (StatusCode, &'static str, String) {
    match err {
        ExportError::SubmissionNotFound(_) => {
            (StatusCode::NOT_FOUND, "SUBMISSION_NOT_FOUND", err.to_string())
        }
        ExportError::NoManuscriptFile => {
            (StatusCode::CONFLICT, "NO_MANUSCRIPT_FILE", err.to_string())
        }
        ExportError::MultipleManuscriptFiles => (
            StatusCode::CONFLICT,
            "MULTIPLE_MANUSCRIPT_FILES",
            err.to_string(),
        ),
        ExportError::EditorLookup { .. } => {
            (StatusCode::BAD_GATEWAY, "EDITOR_LOOKUP_FAILED", err.to_string())
        }
        ExportError::Delivery { .. } => {
            (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED", err.to_string())
        }
        ExportError::UnableToUpdateManuscript(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "UNABLE_TO_UPDATE_MANUSCRIPT",
            err.to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            err.to_string(),
        ),
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_lookup_error_names_the_id() {
        let err = ExportError::EditorLookup {
            id: "ed-42".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(err.to_string().contains("ed-42"));
    }

    #[test]
    fn update_error_names_the_submission() {
        let err = ExportError::UnableToUpdateManuscript("sub-7".to_string());
        assert!(err.to_string().contains("sub-7"));
    }
}
