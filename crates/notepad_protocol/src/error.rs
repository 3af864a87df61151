//! Error types for protocol validation.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Validation failures. Both are reported to the caller and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The slug does not match `^[A-Za-z0-9-_]{1,100}$`.
    #[error("Invalid slug. Use letters, numbers, hyphen, underscore (1-100 chars).")]
    InvalidSlug {
        /// The rejected value.
        slug: String,
    },

    /// The save body is malformed or `content` is missing or not a string.
    #[error("Missing or invalid \"content\" (must be a string).")]
    InvalidPayload {
        /// What was wrong with the body.
        reason: String,
    },
}

impl ProtocolError {
    /// Creates an invalid slug error.
    pub fn invalid_slug(slug: impl Into<String>) -> Self {
        Self::InvalidSlug { slug: slug.into() }
    }

    /// Creates an invalid payload error.
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::invalid_slug("bad slug!");
        assert!(err.to_string().starts_with("Invalid slug"));

        let err = ProtocolError::invalid_payload("content is a number");
        assert!(err.to_string().contains("\"content\""));
    }
}
