//! JSON-file store.
//!
//! The whole map lives in one file and is rewritten on every change through
//! a temporary sibling and a rename, so a crash leaves either the old or the
//! new contents on disk.

use crate::{KeyValueStore, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key-value store persisted as a single JSON object.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| StorageError::Encoding(format!("{}: {}", path.display(), e)))?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = data.len(), "Opened file store");

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.data
            .lock()
            .map_err(|_| StorageError::Platform("file store lock poisoned".to_string()))
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(data).map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.lock()?;
        // The in-memory map only changes once the file has.
        let mut next = data.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *data = next;
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.lock()?;
        if !data.contains_key(key) {
            return Ok(false);
        }
        let mut next = data.clone();
        next.remove(key);
        self.persist(&next)?;
        *data = next;
        Ok(true)
    }
}
