//! Event loop that drives a [`SyncEngine`] from editor events.

use crate::beacon::Beacon;
use crate::cache::LocalCache;
use crate::state::{SyncEngine, SyncStatus};
use crate::transport::NoteTransport;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

/// Something that happened in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The document text changed to this value.
    Input(String),
    /// The editor was hidden (tab switch, minimise).
    Hidden,
    /// The editor became visible again.
    Visible,
    /// The editor is closing.
    Unload,
}

type StatusObserver = Box<dyn FnMut(&SyncStatus) + Send>;

/// A single-threaded session for one document.
///
/// The loop blocks on the event channel until the next debounce deadline,
/// fires due saves, and sends a teardown beacon on [`EditorEvent::Hidden`]
/// and [`EditorEvent::Unload`]. A closed channel counts as an unload.
pub struct Session<T: NoteTransport, C: LocalCache, B: Beacon> {
    engine: SyncEngine<T, C, B>,
    observer: Option<StatusObserver>,
    last_status: Option<SyncStatus>,
    loaded: bool,
}

impl<T: NoteTransport, C: LocalCache, B: Beacon> Session<T, C, B> {
    /// Creates a session around an engine that has not been loaded yet.
    pub fn new(engine: SyncEngine<T, C, B>) -> Self {
        Self {
            engine,
            observer: None,
            last_status: None,
            loaded: false,
        }
    }

    /// Registers a callback invoked whenever the status line changes.
    pub fn with_observer(mut self, observer: impl FnMut(&SyncStatus) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Returns the engine.
    pub fn engine(&self) -> &SyncEngine<T, C, B> {
        &self.engine
    }

    /// Loads the document and returns its text.
    pub fn load(&mut self) -> &str {
        self.engine.load();
        self.loaded = true;
        self.notify();
        self.engine.content()
    }

    /// Processes events until unload, loading first if [`load`](Self::load)
    /// was not called.
    ///
    /// Returns the engine so callers can inspect the final state. A save
    /// still waiting for its deadline at unload is abandoned; the teardown
    /// beacon carries that content instead.
    pub fn run(mut self, events: Receiver<EditorEvent>) -> SyncEngine<T, C, B> {
        if !self.loaded {
            self.load();
        }

        loop {
            let event = match self.engine.next_deadline() {
                Some(deadline) => {
                    let now = Instant::now();
                    if deadline <= now {
                        self.engine.poll(now);
                        self.notify();
                        continue;
                    }
                    match events.recv_timeout(deadline - now) {
                        Ok(event) => Some(event),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => events.recv().ok(),
            };

            match event {
                Some(EditorEvent::Input(text)) => self.engine.edit(text, Instant::now()),
                Some(EditorEvent::Hidden) => self.engine.on_hidden(),
                Some(EditorEvent::Visible) => {
                    tracing::trace!(slug = %self.engine.slug(), "editor visible");
                }
                Some(EditorEvent::Unload) | None => {
                    self.engine.on_unload();
                    self.notify();
                    break;
                }
            }
            self.notify();
        }

        tracing::debug!(
            slug = %self.engine.slug(),
            state = ?self.engine.state(),
            "session ended"
        );
        self.engine
    }

    fn notify(&mut self) {
        let status = self.engine.status();
        if self.last_status.as_ref() == Some(status) {
            return;
        }
        self.last_status = Some(status.clone());
        if let Some(observer) = self.observer.as_mut() {
            observer(status);
        }
    }
}
