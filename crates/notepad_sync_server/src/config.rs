//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for the note server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// SQLite database file. `None` keeps notes in memory.
    pub database_path: Option<PathBuf>,
    /// Directory of static assets served for non-API paths.
    pub static_dir: Option<PathBuf>,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            database_path: None,
            static_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Stores notes in the SQLite database at `path`.
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Serves static assets from `dir`.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
    }
}
