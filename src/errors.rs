use crate::services::storage_service::StorageError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why an upload did not produce a URL.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No usable `file` part in the request. Nothing reached the store.
    #[error("file is required")]
    MissingFile,
    /// Reading the file part failed before any store interaction.
    #[error("{0}")]
    Io(#[source] MultipartError),
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => AppError::bad_request(err.to_string()),
            UploadError::Io(_) | UploadError::Store(_) => AppError::internal(err.to_string()),
        }
    }
}
