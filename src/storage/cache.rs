use super::Result;
use crate::error::StorageError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key-value cache store backing tokens, dictionaries and header catalogs.
///
/// Entries outlive the process. Last writer wins: concurrent processes
/// targeting the same key are accepted without file locking.
pub trait CacheStore: Send + Sync {
    /// Read an entry, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write an entry, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;
    /// Delete an entry. Idempotent: absent entries are not an error.
    fn invalidate(&self, key: &str) -> Result<()>;
}

/// File-backed cache store, one `<key>.json` file per entry.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Create a store rooted at the platform temp directory.
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    /// Create a store rooted at an explicit directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Default for FileCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| StorageError::FileIo {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Ok(Some(content))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, value).map_err(|source| StorageError::FileIo {
            path: path.to_string_lossy().to_string(),
            source,
        })
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::FileIo {
                path: path.to_string_lossy().to_string(),
                source,
            }),
        }
    }
}

/// In-memory cache store for tests.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .remove(key);
        Ok(())
    }
}
