//! # Notepad Protocol
//!
//! Slug rules and wire messages shared by the notepad server and client.
//!
//! This crate provides:
//! - [`Slug`] for deriving and validating note identifiers
//! - JSON request/response messages for the `/api/note/{slug}` endpoints
//! - Validation errors reported to clients as `400 {error}`
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Slug rules
//!
//! A slug is 1 to 100 characters drawn from `[A-Za-z0-9-_]`. The client
//! resolves a raw path segment with [`Slug::resolve`], which never fails and
//! falls back to [`DEFAULT_SLUG`]. The server checks the same predicate again
//! with [`Slug::parse`], which rejects instead of falling back.
//!
//! ```rust
//! use notepad_protocol::Slug;
//!
//! assert_eq!(Slug::resolve("/my-note").as_str(), "my-note");
//! assert_eq!(Slug::resolve("/bad%20slug").as_str(), "default");
//! assert!(Slug::parse("bad slug!").is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod slug;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{ErrorResponse, NoteResponse, SaveRequest, SaveResponse};
pub use slug::{is_valid_slug, Slug, CACHE_KEY_PREFIX, DEFAULT_SLUG, MAX_SLUG_LEN};
