//! String-keyed local persistence.
//!
//! The cache mirrors browser local storage: a flat map of string keys to
//! string values. The file-backed variant keeps the whole map in a single
//! JSON document and rewrites it atomically on every change.
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace};
use tempfile::NamedTempFile;

use crate::{MemoError, Result};

/// File name used inside the data directory
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Key/value store backing the deck collection and the study streak
#[derive(Debug, Clone)]
pub struct LocalCache {
    /// Backing file, `None` for an in-memory cache
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalCache {
    /// Creates a cache that lives only as long as this value
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Opens the cache stored in `data_dir`, creating the directory if needed.
    /// A missing cache file is an empty cache.
    pub fn open(data_dir: &Path) -> Result<Self> {
        if !data_dir.exists() {
            debug!("Data directory does not exist, creating: {}", data_dir.display());
            fs::create_dir_all(data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                MemoError::DirectoryError {
                    path: data_dir.to_path_buf(),
                }
            })?;
        }

        let path = data_dir.join(CACHE_FILE_NAME);
        let entries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                error!("Failed to open cache file {}: {}", path.display(), e);
                MemoError::Io(e)
            })?;
            serde_json::from_str(&content).map_err(|e| {
                error!("Cache file {} is not valid JSON: {}", path.display(), e);
                MemoError::InvalidFormat {
                    message: format!("{}: {}", path.display(), e),
                }
            })?
        } else {
            BTreeMap::new()
        };

        info!("Opened local cache {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores a value and persists the cache. When the write fails the
    /// previous value is kept.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let previous = self.entries.insert(key.to_string(), value.into());
        if let Err(e) = self.flush() {
            self.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    /// Removes a key and persists the cache
    pub fn remove(&mut self, key: &str) -> Result<Option<String>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            if let Err(e) = self.flush() {
                self.restore(key, removed);
                return Err(e);
            }
        }
        Ok(removed)
    }

    fn restore(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => self.entries.insert(key.to_string(), value),
            None => self.entries.remove(key),
        };
    }

    /// Writes the whole map to disk using a temporary file and an atomic move
    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            MemoError::Io(e)
        })?;

        trace!("Serializing {} cache keys", self.entries.len());
        let json = serde_json::to_string_pretty(&self.entries)?;

        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            MemoError::Io(e)
        })?;
        temp_file.flush().map_err(MemoError::Io)?;

        temp_file.persist(path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            MemoError::Io(e.error)
        })?;

        trace!("Cache written to {}", path.display());
        Ok(())
    }
}
