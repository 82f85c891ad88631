//! Key-value stores backing the session

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Persisted string key-value store.
///
/// Reads never fail: a key that cannot be read is simply absent.
pub trait SessionStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Store several values. Stores that persist override this so that
    /// either every value is written or none is.
    fn set_all(&self, values: &[(&str, &str)]) -> Result<()> {
        for (key, value) in values {
            self.set(key, value)?;
        }
        Ok(())
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        read_lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        read_lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        write_lock(&self.entries).remove(key);
        Ok(())
    }
}

/// On-disk layout of a [`FileStore`]
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    entries: HashMap<String, String>,
}

/// Store persisted as a JSON file, rewritten on every mutation.
///
/// The file is created with owner-only permissions on Unix since it holds
/// bearer credentials.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<StoredEntries>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                Error::SessionStore(format!(
                    "Corrupt session file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredEntries::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written, if ever
    pub fn updated_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        read_lock(&self.state).updated_at
    }

    fn persist(&self, state: &StoredEntries) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Apply a change to a copy of the entries and keep it only once the
    /// file has been written.
    fn mutate(&self, apply: impl FnOnce(&mut HashMap<String, String>) -> bool) -> Result<()> {
        let mut state = write_lock(&self.state);
        let mut next = state.clone();
        if !apply(&mut next.entries) {
            return Ok(());
        }
        next.updated_at = Some(chrono::Utc::now());
        self.persist(&next)?;
        *state = next;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        read_lock(&self.state).entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| entries.remove(key).is_some())
    }

    fn set_all(&self, values: &[(&str, &str)]) -> Result<()> {
        self.mutate(|entries| {
            for (key, value) in values {
                entries.insert(key.to_string(), value.to_string());
            }
            true
        })
    }
}
