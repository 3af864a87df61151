//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while talking to the note service or the cache.
///
/// None of these are fatal to the engine. They surface as a status and a
/// counter in [`SyncStats`](crate::SyncStats).
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure: unreachable host, refused connection, timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local cache failure.
    #[error("cache error: {0}")]
    Cache(#[from] std::io::Error),
}

impl SyncError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns true if the request never got an answer from the server.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    /// Returns true if the server rejected the request as invalid (4xx).
    pub fn is_rejected(&self) -> bool {
        matches!(self, SyncError::Status { status, .. } if (400..500).contains(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(SyncError::transport("connection refused").is_transport_failure());

        let rejected = SyncError::Status {
            status: 400,
            message: "Invalid slug".into(),
        };
        assert!(rejected.is_rejected());
        assert!(!rejected.is_transport_failure());

        let failed = SyncError::Status {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert!(!failed.is_rejected());
        assert!(!SyncError::Protocol("bad json".into()).is_transport_failure());
    }

    #[test]
    fn error_display() {
        let err = SyncError::Status {
            status: 400,
            message: "Invalid slug".into(),
        };
        assert_eq!(err.to_string(), "server returned 400: Invalid slug");

        let err = SyncError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert!(err.to_string().starts_with("cache error"));
    }
}
