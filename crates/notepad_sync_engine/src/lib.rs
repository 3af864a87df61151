//! # Notepad Sync Engine
//!
//! Client-side synchronization for notepad documents.
//!
//! This crate provides:
//! - Debounce + dedupe state machine (idle → dirty → saving → idle/offline)
//! - Local fallback cache written on every edit
//! - Fire-and-forget teardown beacon
//! - HTTP transport abstraction
//! - A single-threaded event-loop session
//!
//! ## Architecture
//!
//! Every edit is cached locally first and then arms a debounce timer. When
//! the timer fires the engine compares the text with what the server last
//! confirmed and only sends a save if they differ. A failed save leaves the
//! engine offline until the next edit, which is the only retry. Hiding or
//! closing the editor hands the current text to a [`Beacon`] without
//! waiting for it.
//!
//! ```rust
//! use notepad_protocol::Slug;
//! use notepad_sync_engine::{MemoryCache, MockBeacon, MockTransport, SyncConfig, SyncEngine};
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! let transport = Arc::new(MockTransport::new());
//! let config = SyncConfig::new("mock://", Slug::resolve("/my-note"));
//! let mut engine = SyncEngine::new(
//!     config,
//!     Arc::clone(&transport),
//!     Arc::new(MemoryCache::new()),
//!     Arc::new(MockBeacon::new()),
//! );
//!
//! engine.load();
//! let now = Instant::now();
//! engine.edit("a", now);
//! engine.edit("ab", now);
//! engine.poll(now + Duration::from_millis(500));
//!
//! assert_eq!(transport.stores().len(), 1);
//! assert_eq!(engine.last_synced(), "ab");
//! ```
//!
//! ## Key Invariants
//!
//! - The local cache is written before any network activity
//! - At most one debounced save is in flight per engine
//! - Content equal to the last confirmed content is never sent
//! - Teardown never waits, never panics, and never cancels the timer
//! - Concurrent writers are not reconciled: last write wins

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod beacon;
mod cache;
mod config;
mod error;
mod http;
mod session;
mod state;
mod transport;

pub use beacon::{Beacon, HttpBeacon, MockBeacon};
pub use cache::{FileCache, LocalCache, MemoryCache};
pub use config::{SyncConfig, DEFAULT_DEBOUNCE, DEFAULT_TIMEOUT};
pub use error::{SyncError, SyncResult};
pub use http::{
    HttpClient, HttpMethod, HttpResponse, HttpTransport, LoopbackClient, LoopbackServer,
    ReqwestClient,
};
pub use session::{EditorEvent, Session};
pub use state::{PendingSave, SyncEngine, SyncState, SyncStats, SyncStatus};
pub use transport::{MockTransport, NoteTransport};
