//! Note store trait definition.

use crate::error::StorageResult;
use chrono::{DateTime, Utc};
use notepad_protocol::Slug;

/// A stored note row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    /// Note content.
    pub content: String,
    /// Time of the last write.
    pub updated_at: DateTime<Utc>,
}

/// A durable note table keyed by slug.
///
/// # Invariants
///
/// - At most one row per slug
/// - `get` for a slug that was never written returns `Ok(None)`
/// - `upsert` always replaces the content and stamps `updated_at` with the
///   current time; it never rejects a write because of a previous value
/// - `updated_at` for a slug never decreases, even under concurrent writers
///   or a wall clock that steps backwards
/// - Each `upsert` is atomic with respect to concurrent callers
///
/// # Implementors
///
/// - [`super::InMemoryNoteStore`] - For testing
/// - [`super::SqliteNoteStore`] - For persistent storage
pub trait NoteStore: Send + Sync {
    /// Reads the row for `slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn get(&self, slug: &Slug) -> StorageResult<Option<StoredNote>>;

    /// Inserts or replaces the row for `slug`.
    ///
    /// Returns the row as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn upsert(&self, slug: &Slug, content: &str) -> StorageResult<StoredNote>;

    /// Returns the number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn count(&self) -> StorageResult<usize>;
}

/// Keeps a slug's stamp from moving backwards when the wall clock does.
pub(crate) fn not_before(now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}
