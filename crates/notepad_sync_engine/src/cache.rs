//! Local fallback cache.
//!
//! Every edit is written here before anything touches the network, and a
//! failed load reads it back. Entries are keyed by [`Slug::cache_key`].
//!
//! [`Slug::cache_key`]: notepad_protocol::Slug::cache_key

use crate::error::SyncResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key/value store for unsynced document text.
pub trait LocalCache: Send + Sync {
    /// Reads an entry. A missing entry is `Ok(None)`.
    fn read(&self, key: &str) -> SyncResult<Option<String>>;

    /// Writes an entry, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> SyncResult<()>;
}

/// An in-memory cache. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A cache with one file per entry in a directory.
///
/// File names are the percent-encoded key, so `note:my-note` is stored as
/// `note%3Amy-note`. Writes go to a uniquely named temporary file that is
/// then renamed over the entry, so a reader never sees a half-written value.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens a cache directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> SyncResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(urlencoding::encode(key).as_ref())
    }
}

impl LocalCache for FileCache {
    fn read(&self, key: &str) -> SyncResult<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> SyncResult<()> {
        let path = self.entry_path(key);

        // Each write gets its own temporary file, so writers sharing the
        // directory never truncate each other's half-written value.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.read("note:x").unwrap(), None);

        cache.write("note:x", "a").unwrap();
        cache.write("note:x", "ab").unwrap();
        assert_eq!(cache.read("note:x").unwrap().as_deref(), Some("ab"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn file_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("cache")).unwrap();

        assert_eq!(cache.read("note:my-note").unwrap(), None);
        cache.write("note:my-note", "hello\nworld").unwrap();
        assert_eq!(
            cache.read("note:my-note").unwrap().as_deref(),
            Some("hello\nworld")
        );
        assert!(cache.dir().join("note%3Amy-note").exists());
    }

    #[test]
    fn file_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let cache = FileCache::open(dir.path()).unwrap();
            cache.write("note:x", "cached text").unwrap();
        }
        let cache = FileCache::open(dir.path()).unwrap();
        assert_eq!(cache.read("note:x").unwrap().as_deref(), Some("cached text"));
    }

    #[test]
    fn file_cache_empty_value_is_present() {
        let dir = tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();
        cache.write("note:x", "").unwrap();
        assert_eq!(cache.read("note:x").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn file_cache_concurrent_writers_share_a_key() {
        let dir = tempdir().unwrap();

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = FileCache::open(dir.path()).unwrap();
                std::thread::spawn(move || {
                    for round in 0..50 {
                        cache
                            .write("note:shared", &format!("writer {i} round {round}"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let cache = FileCache::open(dir.path()).unwrap();
        let value = cache.read("note:shared").unwrap().unwrap();
        assert!(value.ends_with("round 49"), "{value}");

        // Only the entry is left behind.
        let names: Vec<_> = fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("note%3Ashared")]);
    }

    #[test]
    fn file_cache_write_error_is_reported() {
        let dir = tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("gone")).unwrap();
        fs::remove_dir(cache.dir()).unwrap();

        assert!(cache.write("note:x", "text").is_err());
    }
}
