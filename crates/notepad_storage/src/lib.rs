//! # Notepad Storage
//!
//! Note store trait and implementations for the notepad service.
//!
//! A store is a durable key-value table keyed by [`Slug`], holding the note
//! content and the time of its last write. It exposes exactly two
//! operations: read and unconditional upsert.
//!
//! ## Design Principles
//!
//! - Writes never compare against a previous value (last write wins)
//! - A missing row is `None`, not an error
//! - Each upsert is a single atomic write, so no cross-request locking
//! - Must be `Send + Sync` for concurrent request handlers
//!
//! ## Available Stores
//!
//! - [`InMemoryNoteStore`] - For testing and ephemeral servers
//! - [`SqliteNoteStore`] - For persistent storage in a SQLite file
//!
//! ## Example
//!
//! ```rust
//! use notepad_protocol::Slug;
//! use notepad_storage::{InMemoryNoteStore, NoteStore};
//!
//! let store = InMemoryNoteStore::new();
//! let slug = Slug::parse("my-note").unwrap();
//! assert!(store.get(&slug).unwrap().is_none());
//!
//! store.upsert(&slug, "hello").unwrap();
//! assert_eq!(store.get(&slug).unwrap().unwrap().content, "hello");
//! ```
//!
//! [`Slug`]: notepad_protocol::Slug

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod sqlite;

pub use backend::{NoteStore, StoredNote};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryNoteStore;
pub use sqlite::SqliteNoteStore;
