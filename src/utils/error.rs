use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::db::ConnectError;
use crate::utils::response::lookup_failure;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Connection error")]
    Connect(#[from] ConnectError),

    #[error("Asset upload failed: {0}")]
    AssetUpload(String),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Connect(_)
            | AppError::AssetUpload(_)
            | AppError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message a client is allowed to see. Upstream failures get a stable
    /// generic string; their detail stays in the server log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Multipart(_) => "Invalid form data format".to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Connect(_) => "The service is temporarily unavailable".to_string(),
            AppError::AssetUpload(_) => "The image upload failed".to_string(),
            AppError::Timeout(_) => "The operation timed out".to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => {
                warn!(error = ?self, message = %msg, "Request rejected");
            }
            AppError::Multipart(e) => {
                warn!(error = ?e, "Malformed multipart body");
            }
            AppError::Database(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::Connect(e) => {
                error!(error = ?e, "Connection acquisition failed");
            }
            AppError::AssetUpload(msg) => {
                error!(message = %msg, "Asset upload failed");
            }
            AppError::Timeout(op) => {
                error!(operation = %op, "Operation timed out");
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout("asset upload")
        } else {
            AppError::AssetUpload(err.to_string())
        }
    }
}

/// Used by the slug lookup route, whose error body is `{success, error}`.
/// The list and create routes shape their own bodies in the handler.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        lookup_failure(self.status_code(), self.public_message())
    }
}
