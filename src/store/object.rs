//! Object store implementations
//!
//! `MemoryObjectStore` for tests and embedding, `FsObjectStore` for one
//! file per blob under a directory.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{KolibriError, Result};

use super::ObjectStore;

// =============================================================================
// In-memory store
// =============================================================================

/// Blobs held in a map
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        self.blobs.write().insert(key.to_string(), bytes);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        self.blobs
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KolibriError::NotFound(format!("blob {}", key)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.blobs
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| KolibriError::NotFound(format!("blob {}", key)))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().contains_key(key))
    }
}

// =============================================================================
// Filesystem store
// =============================================================================

/// One file per blob under `root`
///
/// Writes land in a temporary sibling first and are renamed into place,
/// so a reader never sees a half-written blob.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) a blob directory
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Directory holding the blobs
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(|c: char| c == '/' || c == '\\')
            && !key.starts_with('.');
        if !valid {
            return Err(KolibriError::StorageIo(format!("invalid blob key: {:?}", key)));
        }
        Ok(self.root.join(key))
    }
}

/// Map filesystem errors onto the store taxonomy
fn map_io(key: &str, err: io::Error) -> KolibriError {
    if err.kind() == io::ErrorKind::NotFound {
        KolibriError::NotFound(format!("blob {}", key))
    } else {
        KolibriError::StorageIo(format!("blob {}: {}", key, err))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        let path = self.blob_path(key)?;
        let tmp = self.root.join(format!(".{}.tmp-{}", key, uuid::Uuid::new_v4()));

        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(KolibriError::StorageIo(format!("blob {}: {}", key, e)));
        }

        debug!(key, bytes = bytes.len(), "blob written");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.blob_path(key)?;
        fs::read(&path).map(Bytes::from).map_err(|e| map_io(key, e))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        fs::remove_file(&path).map_err(|e| map_io(key, e))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;
        Ok(path.is_file())
    }
}
