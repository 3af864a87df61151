//! Edit command implementation.
//!
//! Stdin stands in for the editor: every line is appended to the document
//! as one edit, and end of input closes the editor.

use notepad_protocol::Slug;
use notepad_sync_engine::{
    EditorEvent, FileCache, HttpBeacon, ReqwestClient, Session, SyncConfig, SyncEngine,
};
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Runs the edit command.
pub fn run(
    server: &str,
    path: &str,
    cache_dir: &Path,
    debounce_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let slug = Slug::resolve(path);
    let config = SyncConfig::new(server, slug.clone())
        .with_debounce(Duration::from_millis(debounce_ms));

    let transport = Arc::new(super::transport(server)?);
    let cache = Arc::new(FileCache::open(cache_dir)?);
    let beacon = Arc::new(HttpBeacon::new(
        server,
        ReqwestClient::new(config.timeout)?,
    )?);

    eprintln!("{}  /{slug}", slug.title());
    let engine = SyncEngine::new(config, Arc::clone(&transport), cache, beacon);
    let mut session = Session::new(engine).with_observer(|status| eprintln!("[{status}]"));

    let base = session.load().to_string();
    if !base.is_empty() {
        println!("{base}");
    }

    let (tx, rx) = mpsc::channel();
    let reader = thread::Builder::new()
        .name("notepad-stdin".into())
        .spawn(move || read_edits(base, tx))?;

    let engine = session.run(rx);
    if reader.join().is_err() {
        tracing::warn!("stdin reader panicked");
    }

    let stats = engine.stats();
    tracing::info!(
        slug = %slug,
        saves_sent = stats.saves_sent,
        saves_skipped = stats.saves_skipped,
        save_failures = stats.save_failures,
        saves_rejected = stats.saves_rejected,
        beacons = stats.beacons_dispatched,
        "edit session finished"
    );
    if engine.has_unsaved_changes() {
        let reason = transport
            .last_error()
            .unwrap_or_else(|| String::from("save still pending"));
        if transport.is_connected() {
            tracing::warn!(slug = %slug, %reason, "closing with unconfirmed edits, sent by beacon");
        } else {
            tracing::warn!(
                slug = %slug,
                %reason,
                cache = %cache_dir.display(),
                "server unreachable, edits kept in the local cache"
            );
        }
    }

    // Dropping the engine releases the beacon, which delivers the
    // teardown save before returning.
    drop(engine);
    Ok(())
}

/// Turns stdin lines into full-document edits. Returning drops `tx`, which
/// the session treats as unload.
fn read_edits(base: String, tx: mpsc::Sender<EditorEvent>) {
    let mut document = base;
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        append_line(&mut document, &line);
        if tx.send(EditorEvent::Input(document.clone())).is_err() {
            break;
        }
    }
}

fn append_line(document: &mut String, line: &str) {
    if !document.is_empty() && !document.ends_with('\n') {
        document.push('\n');
    }
    document.push_str(line);
}
