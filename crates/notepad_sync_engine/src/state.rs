//! Sync engine state machine.
//!
//! One [`SyncEngine`] per open document. The engine is driven by three
//! kinds of input: edits, the passage of time, and teardown (hide or
//! unload). Time is passed in explicitly, so the machine is deterministic
//! and a driver decides how to wait.
//!
//! ```text
//!  Idle ──edit──▶ Dirty ──deadline──▶ Saving ──ok──▶ Idle
//!   ▲               ▲  │                 │
//!   │               │  └─same content────┼──────────▶ Idle
//!   │               └────────edit────────┤
//!   └──────────────edit── Offline ◀──err─┘
//! ```

use crate::beacon::Beacon;
use crate::cache::LocalCache;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::transport::NoteTransport;
use chrono::{DateTime, Local, Utc};
use notepad_protocol::{SaveResponse, Slug};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The machine state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Local content matches what was last confirmed, or nothing is pending.
    Idle,
    /// Local edits are waiting for the debounce deadline.
    Dirty,
    /// A save request is in flight.
    Saving,
    /// The last load or save failed. The next edit retries.
    Offline,
}

/// The user-visible status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Initial load in progress.
    Loading,
    /// Loaded from the server.
    Loaded {
        /// Server timestamp of the note, `None` for a never-written note.
        updated_at: Option<DateTime<Utc>>,
    },
    /// The server was unreachable, the local copy is shown.
    OfflineLocalCopy,
    /// The server was unreachable and there is no local copy.
    Offline,
    /// Edits are pending or a save is in flight.
    Saving,
    /// Content is known to match the server.
    Saved {
        /// Server timestamp of the save, `None` when no request was needed.
        updated_at: Option<DateTime<Utc>>,
    },
    /// The last save failed.
    OfflineWillRetry,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Loading => f.write_str("Loading..."),
            SyncStatus::Loaded { updated_at: None } => f.write_str("Loaded"),
            SyncStatus::Loaded {
                updated_at: Some(at),
            } => write!(
                f,
                "Loaded ({})",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ),
            SyncStatus::OfflineLocalCopy => f.write_str("Offline (local copy)"),
            SyncStatus::Offline => f.write_str("Offline"),
            SyncStatus::Saving => f.write_str("Saving..."),
            SyncStatus::Saved { updated_at: None } => f.write_str("Saved"),
            SyncStatus::Saved {
                updated_at: Some(at),
            } => write!(f, "Saved {}", at.with_timezone(&Local).format("%H:%M:%S")),
            SyncStatus::OfflineWillRetry => f.write_str("Offline \u{2014} will retry"),
        }
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Save requests issued.
    pub saves_sent: u64,
    /// Debounced flushes that needed no request.
    pub saves_skipped: u64,
    /// Save requests that failed.
    pub save_failures: u64,
    /// Failed saves the server refused as invalid (4xx). Retrying the same
    /// request will not help.
    pub saves_rejected: u64,
    /// Teardown beacons accepted.
    pub beacons_dispatched: u64,
    /// Local cache writes that failed.
    pub cache_write_failures: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// A save that has been started and not yet completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    /// Target note.
    pub slug: Slug,
    /// The content being sent.
    pub content: String,
    /// Edit generation at the time the save started.
    generation: u64,
}

/// The sync engine for one document.
pub struct SyncEngine<T: NoteTransport, C: LocalCache, B: Beacon> {
    config: SyncConfig,
    transport: Arc<T>,
    cache: Arc<C>,
    beacon: Arc<B>,
    content: String,
    /// Content last confirmed written to or read from the server.
    last_synced: String,
    state: SyncState,
    status: SyncStatus,
    deadline: Option<Instant>,
    /// Bumped on every edit.
    generation: u64,
    stats: SyncStats,
}

impl<T: NoteTransport, C: LocalCache, B: Beacon> SyncEngine<T, C, B> {
    /// Creates a new sync engine. Call [`load`](Self::load) before editing.
    pub fn new(config: SyncConfig, transport: Arc<T>, cache: Arc<C>, beacon: Arc<B>) -> Self {
        Self {
            config,
            transport,
            cache,
            beacon,
            content: String::new(),
            last_synced: String::new(),
            state: SyncState::Idle,
            status: SyncStatus::Loading,
            deadline: None,
            generation: 0,
            stats: SyncStats::default(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the document slug.
    pub fn slug(&self) -> &Slug {
        &self.config.slug
    }

    /// Returns the current document text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the content last confirmed by the server.
    pub fn last_synced(&self) -> &str {
        &self.last_synced
    }

    /// Returns true if the current content has not been confirmed by the
    /// server. Content loaded from the local cache counts as unsaved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.content != self.last_synced
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Gets the current status line.
    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Gets the current stats.
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Returns the pending debounce deadline, if a save is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Loads the document from the server, falling back to the local cache.
    pub fn load(&mut self) {
        self.status = SyncStatus::Loading;
        let slug = self.config.slug.clone();

        match self.transport.fetch(&slug) {
            Ok(note) => {
                tracing::debug!(slug = %slug, len = note.content.len(), "loaded note");
                self.content = note.content;
                self.last_synced = self.content.clone();
                self.state = SyncState::Idle;
                self.status = SyncStatus::Loaded {
                    updated_at: note.updated_at,
                };
            }
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "load failed, using local copy");
                self.stats.last_error = Some(e.to_string());

                match self.read_cache() {
                    Some(cached) => {
                        self.content = cached;
                        self.state = SyncState::Idle;
                        self.status = SyncStatus::OfflineLocalCopy;
                    }
                    None => {
                        self.state = SyncState::Offline;
                        self.status = SyncStatus::Offline;
                    }
                }
            }
        }
    }

    /// Records an edit: caches it locally and (re)arms the debounce timer.
    pub fn edit(&mut self, content: impl Into<String>, now: Instant) {
        self.content = content.into();
        self.generation += 1;

        let key = self.config.slug.cache_key();
        if let Err(e) = self.cache.write(&key, &self.content) {
            tracing::warn!(key = %key, error = %e, "local cache write failed");
            self.stats.cache_write_failures += 1;
            self.stats.last_error = Some(e.to_string());
        }

        self.deadline = Some(now + self.config.debounce);
        self.state = SyncState::Dirty;
        self.status = SyncStatus::Saving;
    }

    /// Fires the debounced save if its deadline has passed.
    ///
    /// Returns true if a flush ran.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.flush();
                true
            }
            _ => false,
        }
    }

    /// Saves now through the configured transport, bypassing the timer.
    pub fn flush(&mut self) {
        if let Some(pending) = self.begin_save() {
            let result = self.transport.store(&pending.slug, &pending.content);
            self.complete_save(pending, result);
        }
    }

    /// Starts a save, cancelling the debounce timer.
    ///
    /// Returns `None` if the content already matches the server, in which
    /// case the engine is `Idle` and no request should be made.
    pub fn begin_save(&mut self) -> Option<PendingSave> {
        self.deadline = None;

        if self.content == self.last_synced {
            tracing::trace!(slug = %self.config.slug, "content unchanged, save skipped");
            self.stats.saves_skipped += 1;
            self.state = SyncState::Idle;
            self.status = SyncStatus::Saved { updated_at: None };
            return None;
        }

        self.stats.saves_sent += 1;
        self.state = SyncState::Saving;
        Some(PendingSave {
            slug: self.config.slug.clone(),
            content: self.content.clone(),
            generation: self.generation,
        })
    }

    /// Applies the outcome of a save started with [`begin_save`](Self::begin_save).
    ///
    /// If the document was edited while the request was in flight the
    /// engine stays `Dirty` with its new deadline.
    pub fn complete_save(&mut self, pending: PendingSave, result: SyncResult<SaveResponse>) {
        let edited_meanwhile = pending.generation != self.generation;

        match result {
            Ok(response) => {
                tracing::debug!(slug = %pending.slug, len = pending.content.len(), "saved");
                self.last_synced = pending.content;
                self.stats.last_error = None;
                if !edited_meanwhile {
                    self.state = SyncState::Idle;
                    self.status = SyncStatus::Saved {
                        updated_at: response.updated_at,
                    };
                }
            }
            Err(e) => {
                if e.is_rejected() {
                    tracing::error!(slug = %pending.slug, error = %e, "save rejected by server");
                    self.stats.saves_rejected += 1;
                } else {
                    tracing::warn!(
                        slug = %pending.slug,
                        error = %e,
                        unreachable = e.is_transport_failure(),
                        "save failed"
                    );
                }
                self.stats.save_failures += 1;
                self.stats.last_error = Some(e.to_string());
                if !edited_meanwhile {
                    self.state = SyncState::Offline;
                    self.status = SyncStatus::OfflineWillRetry;
                }
            }
        }
    }

    /// Teardown flush for a hidden editor.
    pub fn on_hidden(&mut self) {
        self.send_beacon();
    }

    /// Teardown flush for a closing editor.
    pub fn on_unload(&mut self) {
        self.send_beacon();
    }

    /// Hands the current content to the beacon without waiting. Leaves the
    /// debounce timer and the dedupe fence untouched.
    fn send_beacon(&mut self) {
        if self.beacon.dispatch(&self.config.slug, &self.content) {
            self.stats.beacons_dispatched += 1;
        }
    }

    fn read_cache(&self) -> Option<String> {
        let key = self.config.slug.cache_key();
        match self.cache.read(&key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "local cache read failed");
                None
            }
        }
    }
}
