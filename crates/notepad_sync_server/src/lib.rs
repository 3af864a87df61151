//! # Notepad Sync Server
//!
//! HTTP note service for the notepad sync engine.
//!
//! This crate provides:
//! - `get`/`put` note semantics with slug and payload validation
//! - HTTP endpoints (`GET`, `PUT`, `POST` on `/api/note/{slug}`)
//! - Optional static file serving with an `index.html` fallback
//!
//! # Architecture
//!
//! The server is a thin wrapper around a [`NoteStore`]. Every save is one
//! unconditional upsert; concurrent writers to the same slug resolve by
//! arrival order at the store and the last one wins. There is no version
//! token and no compare-and-swap.
//!
//! ```rust
//! use notepad_sync_server::{NoteServer, ServerConfig};
//!
//! let server = NoteServer::in_memory(ServerConfig::default());
//! let handler = server.handler();
//!
//! handler.put("my-note", "hello").unwrap();
//! assert_eq!(handler.get("my-note").unwrap().content, "hello");
//! assert!(handler.get("bad slug!").is_err());
//! ```
//!
//! # Protocol
//!
//! - `GET /api/note/{slug}` returns `{slug, content, updatedAt}`; a slug that
//!   was never written returns empty content and a `null` timestamp
//! - `PUT`/`POST /api/note/{slug}` with `{content}` returns `{ok, updatedAt}`;
//!   `POST` exists for teardown transports that cannot choose a method
//! - Validation failures return `400 {error}`, anything else `500`
//!
//! [`NoteStore`]: notepad_storage::NoteStore

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;

pub use config::{ServerConfig, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
pub use error::{ServerError, ServerResult, INTERNAL_ERROR_MESSAGE};
pub use handler::{HandlerContext, RequestHandler};
pub use server::NoteServer;
