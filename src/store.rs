//! Persistence boundary: a key-value state store and the persisted keys.
//!
//! Every persisted value is JSON-serialized. Absence of any key is normal
//! (first run = defaults). There is exactly one writer — the active session —
//! so writes are last-writer-wins with no locking beyond the store's own.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::corpus::Volume;
use crate::error::{StorageError, StorageErrorKind};
use crate::navigation::Selection;

/// Display settings key.
pub const SETTINGS_KEY: &str = "verse-stream.settings";
/// Verse-level highlight map key.
pub const VERSE_HIGHLIGHTS_KEY: &str = "verse-stream.highlights";
/// Phrase highlight map key.
pub const PHRASE_HIGHLIGHTS_KEY: &str = "verse-stream.phrase-highlights";
/// Last-viewed navigation position key.
pub const POSITION_KEY: &str = "verse-stream.position";

/// Abstract persisted key-value store.
pub trait StateStore {
    /// Read a value; `Ok(None)` means the key has never been written.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value. A quota refusal must surface as
    /// [`StorageErrorKind::QuotaExceeded`] so callers can keep in-memory
    /// state and warn instead of losing the mutation silently.
    fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: StateStore + ?Sized> StateStore for &T {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).store(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory store with an optional byte quota, for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStateStore {
    /// Create an unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total byte size of stored values, quota-refusing beyond it.
    pub fn with_quota_bytes(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    fn lock(
        &self,
        key: &str,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| {
            StorageError::new(key, StorageErrorKind::Io, "state store mutex poisoned")
        })
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock(key)?.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock(key)?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                return Err(StorageError::new(
                    key,
                    StorageErrorKind::QuotaExceeded,
                    format!(
                        "value would exceed quota ({} > {})",
                        others + value.len(),
                        quota
                    ),
                ));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock(key)?.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per key under a root directory.
#[derive(Clone, Debug)]
pub struct FileStateStore {
    root: PathBuf,
    max_value_bytes: usize,
}

impl FileStateStore {
    const DEFAULT_MAX_VALUE_BYTES: usize = 4 * 1024 * 1024;

    /// Create a store rooted at a directory (created lazily on first write).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_value_bytes: Self::DEFAULT_MAX_VALUE_BYTES,
        }
    }

    /// Cap individual value size, quota-refusing beyond it.
    pub fn with_max_value_bytes(mut self, max_value_bytes: usize) -> Self {
        self.max_value_bytes = max_value_bytes;
        self
    }

    /// Root directory holding the key files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", sanitized))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(key, StorageErrorKind::Io, e.to_string())),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if value.len() > self.max_value_bytes {
            return Err(StorageError::new(
                key,
                StorageErrorKind::QuotaExceeded,
                format!(
                    "value exceeds max_value_bytes ({} > {})",
                    value.len(),
                    self.max_value_bytes
                ),
            ));
        }
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::new(key, StorageErrorKind::Io, e.to_string()))?;
        let path = self.key_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| StorageError::new(key, StorageErrorKind::Io, e.to_string()))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| StorageError::new(key, StorageErrorKind::Io, e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(key, StorageErrorKind::Io, e.to_string())),
        }
    }
}

/// Last-viewed navigation position.
///
/// The volume is persisted by label so an older payload with a label this
/// build does not recognize degrades to "no volume selected".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPosition {
    pub volume: Option<String>,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
    /// Current page within the filtered set.
    pub page_index: usize,
}

impl ReadingPosition {
    /// Capture a position from a selection and page index.
    pub fn from_selection(selection: &Selection, page_index: usize) -> Self {
        Self {
            volume: selection.volume.map(|v| v.label().to_string()),
            book: selection.book.clone(),
            chapter: selection.chapter,
            verse: selection.verse,
            page_index,
        }
    }

    /// Rebuild the selection this position describes.
    pub fn to_selection(&self) -> Selection {
        Selection {
            volume: self.volume.as_deref().and_then(Volume::from_label),
            book: self.book.clone(),
            chapter: self.chapter,
            verse: self.verse,
        }
    }
}
