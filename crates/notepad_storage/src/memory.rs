//! In-memory note store for testing.

use crate::backend::{not_before, NoteStore, StoredNote};
use crate::error::StorageResult;
use chrono::Utc;
use notepad_protocol::Slug;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory note store.
///
/// This store keeps all notes in a map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Servers started with `--memory` that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across request handlers.
/// Each upsert takes its timestamp while holding the write lock, so
/// concurrent writers are applied one at a time and stamps follow that order.
///
/// # Example
///
/// ```rust
/// use notepad_protocol::Slug;
/// use notepad_storage::{InMemoryNoteStore, NoteStore};
///
/// let store = InMemoryNoteStore::new();
/// let slug = Slug::parse("x").unwrap();
/// store.upsert(&slug, "one").unwrap();
/// store.upsert(&slug, "two").unwrap();
/// assert_eq!(store.get(&slug).unwrap().unwrap().content, "two");
/// assert_eq!(store.count().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    notes: RwLock<HashMap<Slug, StoredNote>>,
}

impl InMemoryNoteStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all rows, sorted by slug.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Slug, StoredNote)> {
        let mut rows: Vec<_> = self
            .notes
            .read()
            .iter()
            .map(|(slug, note)| (slug.clone(), note.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

impl NoteStore for InMemoryNoteStore {
    fn get(&self, slug: &Slug) -> StorageResult<Option<StoredNote>> {
        Ok(self.notes.read().get(slug).cloned())
    }

    fn upsert(&self, slug: &Slug, content: &str) -> StorageResult<StoredNote> {
        let mut notes = self.notes.write();
        let updated_at = not_before(Utc::now(), notes.get(slug).map(|n| n.updated_at));
        let note = StoredNote {
            content: content.to_string(),
            updated_at,
        };
        notes.insert(slug.clone(), note.clone());
        Ok(note)
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.notes.read().len())
    }
}
