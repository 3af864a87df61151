//! Notepad CLI
//!
//! Runs the note server and talks to it from the terminal.
//!
//! # Commands
//!
//! - `serve` - Run the HTTP note server
//! - `get` - Print a note
//! - `put` - Replace a note
//! - `edit` - Edit a note through the sync engine, one stdin line at a time

mod commands;

use clap::{Parser, Subcommand};
use notepad_sync_server::DEFAULT_PORT;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

/// Shared plain-text notes with offline-tolerant sync.
#[derive(Parser)]
#[command(name = "notepad")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP note server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory holding notes.db
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Keep notes in memory only
        #[arg(long, conflicts_with = "data_dir")]
        memory: bool,

        /// Directory of static assets (index.html) served for non-API paths
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print a note
    Get {
        /// Note path, e.g. `/my-note`
        path: String,

        /// Server URL
        #[arg(short, long, env = "NOTEPAD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,

        /// Print the full JSON response
        #[arg(long)]
        json: bool,
    },

    /// Replace a note with CONTENT, or with stdin if omitted
    Put {
        /// Note path, e.g. `/my-note`
        path: String,

        /// New content
        content: Option<String>,

        /// Server URL
        #[arg(short, long, env = "NOTEPAD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,
    },

    /// Edit a note: each stdin line is appended and synced
    Edit {
        /// Note path, e.g. `/my-note`
        path: String,

        /// Server URL
        #[arg(short, long, env = "NOTEPAD_SERVER", default_value = DEFAULT_SERVER)]
        server: String,

        /// Local fallback cache directory
        #[arg(long, default_value = ".notepad-cache")]
        cache_dir: PathBuf,

        /// Quiet period before a save, in milliseconds
        #[arg(long, default_value_t = 500)]
        debounce_ms: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve {
            bind,
            port,
            data_dir,
            memory,
            static_dir,
        } => {
            let database = if memory { None } else { Some(data_dir) };
            commands::serve::run(bind, port, database, static_dir)?;
        }
        Commands::Get { path, server, json } => {
            commands::get::run(&server, &path, json)?;
        }
        Commands::Put {
            path,
            content,
            server,
        } => {
            commands::put::run(&server, &path, content)?;
        }
        Commands::Edit {
            path,
            server,
            cache_dir,
            debounce_ms,
        } => {
            commands::edit::run(&server, &path, &cache_dir, debounce_ms)?;
        }
    }

    Ok(())
}
