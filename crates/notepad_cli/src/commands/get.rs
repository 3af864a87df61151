//! Get command implementation.

use notepad_protocol::Slug;
use notepad_sync_engine::NoteTransport;

/// Runs the get command.
pub fn run(server: &str, path: &str, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let slug = Slug::resolve(path);
    let note = super::transport(server)?.fetch(&slug)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print!("{}", note.content);
        if !note.content.is_empty() && !note.content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
