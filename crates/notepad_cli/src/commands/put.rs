//! Put command implementation.

use notepad_protocol::Slug;
use notepad_sync_engine::NoteTransport;
use std::io::Read;

/// Runs the put command. Reads stdin when `content` is `None`.
pub fn run(
    server: &str,
    path: &str,
    content: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let slug = Slug::resolve(path);
    let content = match content {
        Some(content) => content,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let saved = super::transport(server)?.store(&slug, &content)?;
    match saved.updated_at {
        Some(at) => println!("Saved /{slug} ({} bytes) at {}", content.len(), at.to_rfc3339()),
        None => println!("Saved /{slug} ({} bytes)", content.len()),
    }
    Ok(())
}
