//! Transport layer abstraction for the note service.

use crate::error::{SyncError, SyncResult};
use chrono::Utc;
use notepad_protocol::{NoteResponse, SaveResponse, Slug};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A note transport talks to the remote note service.
///
/// This trait abstracts the network layer so the engine can run against
/// HTTP, an in-process server, or a mock.
pub trait NoteTransport: Send + Sync {
    /// Fetches the note for `slug`.
    fn fetch(&self, slug: &Slug) -> SyncResult<NoteResponse>;

    /// Replaces the content of `slug`.
    fn store(&self, slug: &Slug, content: &str) -> SyncResult<SaveResponse>;
}

/// A mock transport for testing.
///
/// Keeps notes in memory and records every save it receives.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    notes: Mutex<HashMap<Slug, NoteResponse>>,
    stores: Mutex<Vec<(Slug, String)>>,
    fetches: AtomicUsize,
}

impl MockTransport {
    /// Creates a new, connected mock transport.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            notes: Mutex::new(HashMap::new()),
            stores: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Sets the connected state. A disconnected mock fails every request
    /// with a transport error.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Seeds a stored note.
    pub fn set_note(&self, slug: &Slug, content: impl Into<String>) {
        self.notes.lock().insert(
            slug.clone(),
            NoteResponse {
                slug: slug.to_string(),
                content: content.into(),
                updated_at: Some(Utc::now()),
            },
        );
    }

    /// Returns every save received, in order.
    pub fn stores(&self) -> Vec<(Slug, String)> {
        self.stores.lock().clone()
    }

    /// Returns the connected state set by [`set_connected`](Self::set_connected).
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the number of fetches received.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_connected(&self) -> SyncResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SyncError::transport("mock transport disconnected"))
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTransport for MockTransport {
    fn fetch(&self, slug: &Slug) -> SyncResult<NoteResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_connected()?;
        Ok(self
            .notes
            .lock()
            .get(slug)
            .cloned()
            .unwrap_or_else(|| NoteResponse::empty(slug.as_str())))
    }

    fn store(&self, slug: &Slug, content: &str) -> SyncResult<SaveResponse> {
        self.check_connected()?;
        self.stores.lock().push((slug.clone(), content.to_string()));

        let now = Utc::now();
        self.notes.lock().insert(
            slug.clone(),
            NoteResponse {
                slug: slug.to_string(),
                content: content.to_string(),
                updated_at: Some(now),
            },
        );
        Ok(SaveResponse::success(now))
    }
}
