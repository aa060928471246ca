//! Error types shared across the ingestion and export pipeline
//!
//! Every fallible operation in the crate funnels into [`AppError`], which
//! carries a stable machine-readable kind alongside the human-readable
//! message. Handlers convert errors into JSON responses of the shape
//! `{"error": "<kind>", "message": "<detail>"}`.
//!
//! # Examples
//!
//! ```rust
//! use ziplabel::error::AppError;
//!
//! let err = AppError::UnknownLabel("cat".to_string());
//! assert_eq!(err.kind(), "UnknownLabel");
//! assert!(err.is_client_error());
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors produced by upload, labeling, and export operations
#[derive(Error, Debug)]
pub enum AppError {
    /// Upload was not a readable zip archive
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// Archive contents exceed the configured uncompressed size limit
    #[error("Archive too large: {0}")]
    TooLarge(String),

    /// Image not found by id in the current session
    #[error("Image {0} not found")]
    NotFound(u64),

    /// Image reference could not be resolved against the current session
    #[error("Unknown image: {0}")]
    UnknownImage(String),

    /// Label is not part of the label set
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    /// Label name failed validation
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Label already exists in the label set
    #[error("Label '{0}' already exists")]
    AlreadyExists(String),

    /// Label is built-in and cannot be removed
    #[error("Label '{0}' is protected and cannot be removed")]
    ProtectedLabel(String),

    /// Export selection resolved to zero images
    #[error("Selection contains no images")]
    EmptySelection,

    /// Filesystem or archive I/O failed
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl AppError {
    /// Stable kind string used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidArchive(_) => "InvalidArchive",
            AppError::TooLarge(_) => "TooLarge",
            AppError::NotFound(_) => "NotFound",
            AppError::UnknownImage(_) => "UnknownImage",
            AppError::UnknownLabel(_) => "UnknownLabel",
            AppError::InvalidLabel(_) => "InvalidLabel",
            AppError::AlreadyExists(_) => "AlreadyExists",
            AppError::ProtectedLabel(_) => "ProtectedLabel",
            AppError::EmptySelection => "EmptySelection",
            AppError::StorageFailure(_) => "StorageFailure",
        }
    }

    /// HTTP status the error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArchive(_)
            | AppError::UnknownLabel(_)
            | AppError::InvalidLabel(_)
            | AppError::EmptySelection => StatusCode::BAD_REQUEST,
            AppError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) | AppError::UnknownImage(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ProtectedLabel(_) => StatusCode::FORBIDDEN,
            AppError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageFailure(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidArchive("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::TooLarge("512 MB".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AppError::NotFound(3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UnknownImage("a.png".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::AlreadyExists("cat".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ProtectedLabel("None".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::EmptySelection.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::StorageFailure("disk".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(AppError::EmptySelection.kind(), "EmptySelection");
        assert_eq!(AppError::NotFound(0).kind(), "NotFound");
        assert_eq!(AppError::UnknownLabel("x".into()).kind(), "UnknownLabel");
        assert_eq!(AppError::StorageFailure("x".into()).kind(), "StorageFailure");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::InvalidLabel("".into()).is_client_error());
        assert!(AppError::NotFound(1).is_client_error());
        assert!(!AppError::StorageFailure("io".into()).is_client_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert_eq!(err.kind(), "StorageFailure");
    }
}
