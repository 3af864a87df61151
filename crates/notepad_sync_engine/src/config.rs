//! Configuration for the sync engine.

use notepad_protocol::Slug;
use std::time::Duration;

/// Default quiet period between the last edit and the save.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one open document.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server URL (e.g. `http://127.0.0.1:3000`).
    pub server_url: String,
    /// The document being edited.
    pub slug: Slug,
    /// Quiet period after the last edit before a save is attempted.
    pub debounce: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(server_url: impl Into<String>, slug: Slug) -> Self {
        Self {
            server_url: server_url.into(),
            slug,
            debounce: DEFAULT_DEBOUNCE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("", Slug::default_slug())
    }
}
