//! Client-local key-value persistence ("local storage").

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// Whole-value text storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// `None` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;
}

/// One file per key under a directory; writes are atomic (tmp + rename).
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, crate::Error> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(crate::Error::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, crate::Error> {
        let path = self.path_for(key)?;
        if !path.exists() {
            debug!(path = %path.display(), "No stored value");
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| crate::Error::Storage(format!("Failed to read {}: {e}", path.display())))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), crate::Error> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            crate::Error::Storage(format!("Failed to create storage directory: {e}"))
        })?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)
            .map_err(|e| crate::Error::Storage(format!("Failed to write {key}: {e}")))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| crate::Error::Storage(format!("Failed to rename {key}: {e}")))?;

        info!(path = %path.display(), bytes = value.len(), "Stored value saved");
        Ok(())
    }
}

/// Volatile store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, crate::Error> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), crate::Error> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
