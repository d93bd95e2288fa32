//! Key-value storage backends
//!
//! Values are JSON documents stored under short keys. `FileStorage` keeps one
//! `<key>.json` file per key in a directory; `MemoryStorage` backs tests and
//! sessions that could not be persisted.

use crate::error::{QuoteError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Persistent keys
pub const QUOTES_KEY: &str = "quotes";
pub const LAST_VIEWED_KEY: &str = "lastViewedQuote";
pub const USER_PREFERENCES_KEY: &str = "userPreferences";
pub const FILTER_PREFERENCES_KEY: &str = "filterPreferences";
pub const LAST_SYNC_KEY: &str = "lastSync";
pub const PENDING_PUSH_KEY: &str = "pendingPush";

/// Session keys
pub const LAST_QUOTE_KEY: &str = "lastQuote";
pub const CURSOR_KEY: &str = "presenterCursor";

/// Abstract key-value store
pub trait KeyValueStorage {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key
    fn clear(&self) -> Result<()>;
}

/// Read and decode a JSON value.
///
/// Missing keys and undecodable values both come back as `None`; the latter is
/// logged so stale shapes do not break startup.
pub fn read_json<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read from storage");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unparseable stored value");
            None
        }
    }
}

/// Encode a value as JSON and store it
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// Directory-backed storage, one JSON file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        FileStorage { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn storage_error(key: &str, e: std::io::Error) -> QuoteError {
        QuoteError::Storage(format!("'{}': {}", key, e))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_error(key, e)),
        }
    }

    /// Write to a temp file in the same directory, then rename into place.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::storage_error(key, e))?;

        let path = self.path_for(key);
        let tmp_path = self
            .dir
            .join(format!("{}.json.tmp-{}", key, std::process::id()));

        fs::write(&tmp_path, value).map_err(|e| Self::storage_error(key, e))?;

        // rename does not overwrite on Windows
        if cfg!(windows) && path.exists() {
            fs::remove_file(&path).map_err(|e| Self::storage_error(key, e))?;
        }

        fs::rename(&tmp_path, &path).map_err(|e| Self::storage_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::storage_error(key, e)),
        }
    }

    fn clear(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Self::storage_error("*", e)),
        };

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| Self::storage_error("*", e))?;
            }
        }

        Ok(())
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}
