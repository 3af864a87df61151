//! Serve command implementation.

use notepad_sync_server::{NoteServer, ServerConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Name of the database file inside the data directory.
const DATABASE_FILE: &str = "notes.db";

/// Builds the server configuration from command-line arguments.
pub fn config(
    bind: IpAddr,
    port: u16,
    data_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> ServerConfig {
    let mut config = ServerConfig::new(SocketAddr::new(bind, port));
    if let Some(dir) = data_dir {
        config = config.with_database(dir.join(DATABASE_FILE));
    }
    if let Some(dir) = static_dir {
        config = config.with_static_dir(dir);
    }
    config
}

/// Runs the serve command until Ctrl+C.
pub fn run(
    bind: IpAddr,
    port: u16,
    data_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = NoteServer::open(config(bind, port, data_dir, static_dir))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server.serve())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_lives_in_data_dir() {
        let config = config(
            IpAddr::from([0, 0, 0, 0]),
            3000,
            Some(PathBuf::from("data")),
            None,
        );
        assert_eq!(config.database_path, Some(PathBuf::from("data/notes.db")));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn memory_mode_has_no_database() {
        let config = config(
            IpAddr::from([127, 0, 0, 1]),
            0,
            None,
            Some(PathBuf::from("public")),
        );
        assert!(config.database_path.is_none());
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
    }
}
