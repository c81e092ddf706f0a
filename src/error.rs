//! HTTP error taxonomy and JSON error bodies.
//!
//! DESIGN
//! ======
//! Every failure a handler can produce collapses into `ApiError`, which maps
//! onto three user-visible classes: validation (400), not found (404), and
//! backend (500). The body always carries a grepable `code` and a message;
//! validation errors add the offending `path`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};
use uischema::ValidationError;

use crate::storage::StorageError;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and HTTP status for structured error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn status(&self) -> StatusCode;
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        "E_VALIDATION"
    }

    fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Io(_)
            | Self::Json(_)
            | Self::Corrupt { .. }
            | Self::Request(_)
            | Self::Remote { .. }
            | Self::Config(_) => "E_BACKEND",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// API ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Request body could not be read as JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::BadRequest(_) => "E_BAD_REQUEST",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(e) => e.status(),
            Self::Storage(e) => e.status(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        let (message, path) = match self {
            Self::Validation(e) => (e.message.clone(), Some(e.path.clone()).filter(|p| !p.is_empty())),
            Self::Storage(StorageError::NotFound(_)) => ("UI not found".to_owned(), None),
            other => (other.to_string(), None),
        };
        ErrorBody { success: false, code: self.error_code(), message, path }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        } else if !matches!(self, Self::Storage(StorageError::NotFound(_))) {
            warn!(code = self.error_code(), error = %self, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
