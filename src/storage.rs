use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, error, info, trace};
use tempfile::NamedTempFile;

use crate::{PinError, Result};

/// Durable key-value blob storage that survives restarts.
pub trait BlobStore: Send {
    /// Replaces the blob stored under `key`.
    fn save(&self, key: &str, blob: &str) -> Result<()>;

    /// Returns the blob stored under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<String>>;
}

/// Stores each blob as `<key>.json` inside a data directory.
pub struct FileBlobStore {
    /// Directory holding the blob files
    data_dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Helper method to get the file path for a key
    fn blob_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileBlobStore {
    /// Saves a blob using atomic operations to prevent data corruption
    fn save(&self, key: &str, blob: &str) -> Result<()> {
        let file_path = self.blob_path(key);
        debug!("Saving blob {} to {}", key, file_path.display());

        // Ensure the data directory exists
        if !self.data_dir.exists() {
            debug!("Creating data directory: {}", self.data_dir.display());
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                error!(
                    "Failed to create directory {}: {}",
                    self.data_dir.display(),
                    e
                );
                PinError::Io(e)
            })?;
        }

        // Create a temporary file in the same directory (for atomic operation)
        let dir = file_path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            PinError::Io(e)
        })?;

        trace!("Writing {} bytes to temporary file", blob.len());
        temp_file.write_all(blob.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            PinError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            PinError::Io(e)
        })?;

        // Atomically move the temporary file to the target location
        temp_file.persist(&file_path).map_err(|e| {
            error!(
                "Failed to persist file {}: {}",
                file_path.display(),
                e.error
            );
            PinError::Io(e.error)
        })?;

        info!("Blob {} saved", key);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let file_path = self.blob_path(key);
        if !file_path.exists() {
            debug!("No blob stored at {}", file_path.display());
            return Ok(None);
        }

        let blob = fs::read_to_string(&file_path).map_err(|e| {
            error!("Failed to read {}: {}", file_path.display(), e);
            PinError::Io(e)
        })?;

        trace!("Loaded {} bytes from {}", blob.len(), file_path.display());
        Ok(Some(blob))
    }
}

/// In-memory blob storage. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an existing blob.
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let store = Self::new();
        if let Ok(mut blobs) = store.blobs.lock() {
            blobs.insert(key.to_string(), blob.to_string());
        }
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, key: &str, blob: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|e| lock_failed(&e))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().map_err(|e| lock_failed(&e))?;
        Ok(blobs.get(key).cloned())
    }
}

fn lock_failed(e: &dyn std::fmt::Display) -> PinError {
    PinError::Io(std::io::Error::other(format!(
        "Failed to acquire lock on blob store: {}",
        e
    )))
}
