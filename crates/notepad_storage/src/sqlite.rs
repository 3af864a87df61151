//! SQLite-backed note store for persistent storage.

use crate::backend::{not_before, NoteStore, StoredNote};
use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use notepad_protocol::Slug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
  slug TEXT PRIMARY KEY,
  content TEXT NOT NULL DEFAULT '',
  updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

const SELECT_NOTE: &str = "SELECT content, updated_at FROM notes WHERE slug = ?1";

const SELECT_STAMP: &str = "SELECT updated_at FROM notes WHERE slug = ?1";

const UPSERT_NOTE: &str = "
INSERT INTO notes (slug, content, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(slug) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at
";

/// A SQLite-backed note store.
///
/// Notes live in a single `notes` table keyed by slug. File databases are
/// opened in WAL journal mode.
///
/// # Durability
///
/// Every upsert is a single autocommit statement, so it is durable once it
/// returns and atomic with respect to other writers.
///
/// # Thread Safety
///
/// The connection sits behind a mutex; concurrent callers are serialized.
///
/// # Example
///
/// ```no_run
/// use notepad_protocol::Slug;
/// use notepad_storage::{NoteStore, SqliteNoteStore};
/// use std::path::Path;
///
/// let store = SqliteNoteStore::open(Path::new("data/notes.db")).unwrap();
/// store.upsert(&Slug::parse("my-note").unwrap(), "persistent text").unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteNoteStore {
    /// Opens or creates a database file, creating parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the database
    /// cannot be opened or initialized.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened note database");
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database with the notes schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Returns the database path, or `None` for an in-memory database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl NoteStore for SqliteNoteStore {
    fn get(&self, slug: &Slug) -> StorageResult<Option<StoredNote>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(SELECT_NOTE, params![slug.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;

        match row {
            Some((content, stamp)) => Ok(Some(StoredNote {
                content,
                updated_at: parse_timestamp(&stamp)?,
            })),
            None => Ok(None),
        }
    }

    fn upsert(&self, slug: &Slug, content: &str) -> StorageResult<StoredNote> {
        // Stamp under the lock so stamps for a slug follow write order.
        let conn = self.conn.lock();
        let previous = conn
            .query_row(SELECT_STAMP, params![slug.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .optional()?
            .and_then(|stamp| parse_timestamp(&stamp).ok());
        let stamp = format_timestamp(not_before(Utc::now(), previous));
        conn.execute(UPSERT_NOTE, params![slug.as_str(), content, stamp])?;
        drop(conn);

        Ok(StoredNote {
            content: content.to_string(),
            updated_at: parse_timestamp(&stamp)?,
        })
    }

    fn count(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StorageError::Corrupted(format!("row count {count}")))
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 stamps written by this store and the
/// `YYYY-MM-DD HH:MM:SS` form produced by `CURRENT_TIMESTAMP`.
fn parse_timestamp(stamp: &str) -> StorageResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(stamp) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| StorageError::Corrupted(format!("unreadable updated_at {stamp:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    #[test]
    fn get_missing_is_none() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        assert!(store.get(&slug("fresh-slug")).unwrap().is_none());
        assert!(store.path().is_none());
    }

    #[test]
    fn upsert_then_get() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let written = store.upsert(&slug("my-note"), "abc").unwrap();
        let read = store.get(&slug("my-note")).unwrap().unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn last_write_wins() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store.upsert(&slug("x"), "one").unwrap();
        store.upsert(&slug("x"), "two").unwrap();

        assert_eq!(store.get(&slug("x")).unwrap().unwrap().content, "two");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn empty_string_clears() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store.upsert(&slug("x"), "text").unwrap();
        store.upsert(&slug("x"), "").unwrap();
        assert_eq!(store.get(&slug("x")).unwrap().unwrap().content, "");
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");

        {
            let store = SqliteNoteStore::open(&path).unwrap();
            store.upsert(&slug("kept"), "survives restart").unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
        }

        let store = SqliteNoteStore::open(&path).unwrap();
        let note = store.get(&slug("kept")).unwrap().unwrap();
        assert_eq!(note.content, "survives restart");
    }

    #[test]
    fn reads_default_timestamp() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO notes (slug, content) VALUES ('legacy', 'old')",
                [],
            )
            .unwrap();

        let note = store.get(&slug("legacy")).unwrap().unwrap();
        assert_eq!(note.content, "old");
    }

    #[test]
    fn unreadable_timestamp_is_corruption() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO notes (slug, content, updated_at) VALUES ('bad', 'x', 'yesterday')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.get(&slug("bad")),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn stamp_never_precedes_previous_write() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO notes (slug, content, updated_at) \
                 VALUES ('ahead', 'x', '2999-01-01T00:00:00.000Z')",
                [],
            )
            .unwrap();

        let written = store.upsert(&slug("ahead"), "y").unwrap();
        let expected = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(written.updated_at, expected);
        assert_eq!(store.get(&slug("ahead")).unwrap().unwrap(), written);
    }

    #[test]
    fn unreadable_previous_stamp_is_overwritten() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO notes (slug, content, updated_at) VALUES ('bad', 'x', 'yesterday')",
                [],
            )
            .unwrap();

        store.upsert(&slug("bad"), "fixed").unwrap();
        assert_eq!(store.get(&slug("bad")).unwrap().unwrap().content, "fixed");
    }

    #[test]
    fn timestamp_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(at)).unwrap(), at);
        assert_eq!(parse_timestamp("2024-02-29 23:59:58").unwrap(), at);
    }
}
