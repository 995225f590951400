//! Persistent key-value storage for saved credentials.
//!
//! The SDK only ever needs a handful of keys (see
//! [`keys`](crate::keys)), so the store is a flat string → value map with
//! two value kinds. Writes are buffered in memory until
//! [`flush`](KeyValueStore::flush).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Errors from a [`KeyValueStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("store file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// A small persistent map of named strings and integers.
///
/// Getters return `None` for a missing key *or* a key holding the other
/// value kind. Setters and `delete` only touch the in-memory view;
/// `flush` makes them durable.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_string(&self, key: &str, value: &str);
    fn set_int(&self, key: &str, value: i64);
    fn delete(&self, key: &str);

    /// Writes pending changes to durable storage.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be written.
    fn flush(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Int(i64),
    Text(String),
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A store that lives only as long as the process. `flush` is a no-op.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries(entries: BTreeMap<String, StoredValue>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StoredValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.lock().get(key) {
            Some(StoredValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.lock().get(key) {
            Some(StoredValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    fn set_string(&self, key: &str, value: &str) {
        self.lock()
            .insert(key.to_owned(), StoredValue::Text(value.to_owned()));
    }

    fn set_int(&self, key: &str, value: i64) {
        self.lock().insert(key.to_owned(), StoredValue::Int(value));
    }

    fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A store backed by a single JSON object on disk.
///
/// The file is read once on [`open`](Self::open) and rewritten whole on
/// every [`flush`](KeyValueStore::flush). Each flush writes a uniquely
/// named temporary file in the same directory and renames it over the
/// store, so neither a crash nor another process flushing the same path
/// can leave a truncated or interleaved file. The last rename wins.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: MemoryStore,
}

impl FileStore {
    /// Opens the store at `path`. A missing or empty file is an empty
    /// store; it is created on the first flush.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file exists but cannot be read,
    /// or [`StoreError::Format`] if it is not a JSON object of strings
    /// and integers.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: MemoryStore::with_entries(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.entries.get_string(key)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.entries.get_int(key)
    }

    fn set_string(&self, key: &str, value: &str) {
        self.entries.set_string(key, value);
    }

    fn set_int(&self, key: &str, value: i64) {
        self.entries.set_int(key, value);
    }

    fn delete(&self, key: &str) {
        self.entries.delete(key);
    }

    fn flush(&self) -> Result<(), StoreError> {
        // Held across the write so flushes through this store are serialized.
        let entries = self.entries.lock();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &*entries)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        tracing::trace!(path = %self.path.display(), "flushed file store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_separates_value_kinds() {
        let store = MemoryStore::new();
        store.set_string("name", "ada");
        store.set_int("level", 7);

        assert_eq!(store.get_string("name").as_deref(), Some("ada"));
        assert_eq!(store.get_int("level"), Some(7));
        // Wrong kind reads as absent.
        assert_eq!(store.get_int("name"), None);
        assert_eq!(store.get_string("level"), None);
    }

    #[test]
    fn test_memory_store_delete_removes_key() {
        let store = MemoryStore::new();
        store.set_string("k", "v");
        store.delete("k");
        store.delete("never-set");
        assert_eq!(store.get_string("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let store = FileStore::open(dir.path().join("auth.json"))
            .expect("missing file should open");
        assert_eq!(store.get_string("anything"), None);
    }

    #[test]
    fn test_file_store_flush_survives_reopen() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("nested").join("auth.json");

        let store = FileStore::open(&path).expect("should open");
        store.set_string("CrateBytes_PlayerId", "p1");
        store.set_int("CrateBytes_SequentialId", 42);
        store.flush().expect("should flush");

        let reopened = FileStore::open(&path).expect("should reopen");
        assert_eq!(reopened.get_string("CrateBytes_PlayerId").as_deref(), Some("p1"));
        assert_eq!(reopened.get_int("CrateBytes_SequentialId"), Some(42));
    }

    #[test]
    fn test_file_store_unflushed_writes_are_not_durable() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("auth.json");

        let store = FileStore::open(&path).expect("should open");
        store.set_string("k", "v");
        drop(store);

        let reopened = FileStore::open(&path).expect("should reopen");
        assert_eq!(reopened.get_string("k"), None);
    }

    #[test]
    fn test_file_store_concurrent_flushes_leave_one_whole_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("auth.json");

        let first = FileStore::open(&path).expect("should open");
        let second = FileStore::open(&path).expect("should open");
        first.set_string("owner", "first");
        second.set_string("owner", "second");

        std::thread::scope(|scope| {
            for store in [&first, &second] {
                scope.spawn(move || {
                    for _ in 0..50 {
                        store.flush().expect("should flush");
                    }
                });
            }
        });

        let reopened = FileStore::open(&path).expect("file should be whole JSON");
        let owner = reopened.get_string("owner");
        assert!(
            matches!(owner.as_deref(), Some("first") | Some("second")),
            "unexpected owner {owner:?}"
        );
        let leftovers = fs::read_dir(dir.path())
            .expect("should list dir")
            .count();
        assert_eq!(leftovers, 1, "temporary files should not be left behind");
    }

    #[test]
    fn test_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("auth.json");
        fs::write(&path, "[1, 2, 3]").expect("should write");

        let err = FileStore::open(&path).expect_err("array is not a store");
        assert!(matches!(err, StoreError::Format(_)));
    }
}
