//! Error types for the note server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notepad_protocol::{ErrorResponse, ProtocolError};
use notepad_storage::StorageError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Body of every `5xx` response. Details stay in the server log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Errors that can occur in the note server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid slug or save payload.
    #[error(transparent)]
    Validation(#[from] ProtocolError),

    /// No route for the requested path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServerError::Validation(_) | ServerError::NotFound(_))
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_error() {
            tracing::debug!(%status, error = %self, "rejected request");
            self.to_string()
        } else {
            tracing::error!(%status, error = %self, "request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
