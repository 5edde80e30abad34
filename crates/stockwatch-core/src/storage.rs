//! Key/value blob storage for persisted snapshots.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::error::StorageError;

/// Durable byte storage addressed by short string keys.
///
/// Keys are restricted to ASCII letters, digits, `.`, `-` and `_`.
pub trait BlobStore: Send + Sync {
    /// Returns the stored bytes, or `None` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the bytes stored under `key`.
    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(key, source)),
        }
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| io_error(key, source))?;

        // Temp file in the same directory so the rename never crosses filesystems.
        let mut staged = NamedTempFile::new_in(&self.root).map_err(|source| io_error(key, source))?;
        staged
            .write_all(bytes)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|source| io_error(key, source))?;
        staged
            .persist(&path)
            .map_err(|error| io_error(key, error.error))?;
        Ok(())
    }
}

/// Thread-safe in-process store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `key` directly, bypassing validation of the payload.
    pub fn with_blob(self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.into(), bytes.into());
        }
        self
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Unavailable(String::from("memory store lock poisoned")))?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Unavailable(String::from("memory store lock poisoned")))?;
        blobs.insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        && key != "."
        && key != "..";
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_owned(),
        })
    }
}

fn io_error(key: &str, source: io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_owned(),
        source,
    }
}
