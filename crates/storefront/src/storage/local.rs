//! Synchronous in-process store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::StorageError;

/// JSON strings keyed by name, held in memory.
///
/// Every call completes immediately. When opened with a path, the whole map
/// is rewritten to that file after each change and reloaded on startup, so
/// carts survive restarts without a database.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

#[derive(Default)]
struct LocalStoreInner {
    entries: Mutex<HashMap<String, String>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store mirrored to `path`.
    ///
    /// A missing file starts an empty store. An unreadable or corrupt file is
    /// logged and also starts empty; it is overwritten on the next write.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local store file unreadable, starting empty");
                HashMap::new()
            }
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "Local store opened");

        Self {
            inner: Arc::new(LocalStoreInner {
                entries: Mutex::new(entries),
                path: Some(path),
            }),
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.inner.entries.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Read the JSON stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Poisoned`] if the lock is poisoned.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Store `json` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned or the mirror file cannot be
    /// written. A failed write leaves the in-memory value unchanged.
    pub fn set(&self, key: &str, json: String) -> Result<(), StorageError> {
        self.commit(|entries| {
            entries.insert(key.to_string(), json);
            true
        })
    }

    /// Delete `key`.
    ///
    /// # Errors
    ///
    /// Same as [`LocalStore::set`].
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.commit(|entries| entries.remove(key).is_some())
    }

    /// Apply `change` to the map. With a mirror file the change is made on a
    /// copy, written out, and only then swapped in.
    fn commit<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let mut entries = self.entries()?;
        let Some(path) = &self.inner.path else {
            change(&mut entries);
            return Ok(());
        };

        let mut next = entries.clone();
        if change(&mut next) {
            write_entries(path, &next)?;
            *entries = next;
        }
        Ok(())
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries()?.len())
    }

    /// Returns `true` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Poisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.entries()?.is_empty())
    }
}

fn write_entries(path: &Path, entries: &HashMap<String, String>) -> Result<(), StorageError> {
    let json = serde_json::to_vec(entries)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn load_entries(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}
