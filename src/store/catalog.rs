//! Catalog
//!
//! Users, quotas and file records behind one lock, optionally mirrored to
//! a snapshot file on every mutation.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KolibriError, Result};
use crate::record::{FileRecord, QuotaState};

use super::{RecordStore, UserDirectory};

/// Magic bytes identifying a catalog snapshot
const MAGIC: &[u8; 4] = b"KCAT";

/// Current snapshot format version
const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2)
const HEADER_SIZE: usize = 6;

/// Trailer size: CRC32 of the body
const TRAILER_SIZE: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogState {
    users: BTreeMap<String, QuotaState>,
    files: BTreeMap<String, FileRecord>,
}

/// Transactional user/record catalog
///
/// ## Concurrency:
/// - `state`: RwLock (many concurrent readers, exclusive writer)
/// - Mutations are applied to a copy, persisted, then swapped in, so a
///   failed snapshot write leaves the visible state untouched
pub struct Catalog {
    state: RwLock<CatalogState>,
    snapshot_path: Option<PathBuf>,
}

impl Catalog {
    /// Catalog that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            snapshot_path: None,
        }
    }

    /// Open or create a catalog backed by `path`
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let bytes = fs::read(path)?;
            let state = decode_snapshot(&bytes)?;
            info!(
                users = state.users.len(),
                files = state.files.len(),
                "catalog loaded"
            );
            state
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            CatalogState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    /// Snapshot file, if any
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn user_count(&self) -> usize {
        self.state.read().users.len()
    }

    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    /// Apply `f` to a copy of the state, persist it, then publish it
    fn mutate<T>(&self, f: impl FnOnce(&mut CatalogState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let out = f(&mut next)?;

        if let Some(path) = &self.snapshot_path {
            write_snapshot(path, &next)?;
        }

        *state = next;
        Ok(out)
    }
}

impl UserDirectory for Catalog {
    fn register(&self, owner_id: &str, quota: QuotaState) -> Result<()> {
        self.mutate(|state| {
            if state.users.contains_key(owner_id) {
                return Err(KolibriError::UserExists(owner_id.to_string()));
            }
            state.users.insert(owner_id.to_string(), quota);
            Ok(())
        })
    }

    fn get_quota(&self, owner_id: &str) -> Result<QuotaState> {
        self.state
            .read()
            .users
            .get(owner_id)
            .copied()
            .ok_or_else(|| KolibriError::NotFound(format!("user {}", owner_id)))
    }

    fn persist_quota(&self, owner_id: &str, quota: QuotaState) -> Result<()> {
        self.mutate(|state| match state.users.get_mut(owner_id) {
            Some(slot) => {
                *slot = quota;
                Ok(())
            }
            None => Err(KolibriError::NotFound(format!("user {}", owner_id))),
        })
    }
}

impl RecordStore for Catalog {
    fn insert_record(&self, record: FileRecord) -> Result<()> {
        self.mutate(|state| {
            if state.files.contains_key(&record.id) {
                return Err(KolibriError::StorageIo(format!(
                    "duplicate file id {}",
                    record.id
                )));
            }
            state.files.insert(record.id.clone(), record);
            Ok(())
        })
    }

    fn get_record(&self, file_id: &str) -> Result<Option<FileRecord>> {
        Ok(self.state.read().files.get(file_id).cloned())
    }

    fn remove_record(&self, file_id: &str) -> Result<Option<FileRecord>> {
        if !self.state.read().files.contains_key(file_id) {
            return Ok(None);
        }
        self.mutate(|state| Ok(state.files.remove(file_id)))
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>> {
        let mut records: Vec<FileRecord> = self
            .state
            .read()
            .files
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }
}

// =============================================================================
// Snapshot I/O
// =============================================================================

fn encode_snapshot(state: &CatalogState) -> Result<Vec<u8>> {
    let body = bincode::serialize(state)
        .map_err(|e| KolibriError::Serialization(format!("catalog: {}", e)))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len() + TRAILER_SIZE);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    Ok(out)
}

fn decode_snapshot(bytes: &[u8]) -> Result<CatalogState> {
    if bytes.len() < HEADER_SIZE + TRAILER_SIZE {
        return Err(KolibriError::Serialization(format!(
            "catalog snapshot too short: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(KolibriError::Serialization(format!(
            "invalid catalog magic: expected KCAT, got {:?}",
            &bytes[0..4]
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(KolibriError::Serialization(format!(
            "unsupported catalog version: {}",
            version
        )));
    }

    let body_end = bytes.len() - TRAILER_SIZE;
    let body = &bytes[HEADER_SIZE..body_end];
    let stored_crc = u32::from_le_bytes([
        bytes[body_end],
        bytes[body_end + 1],
        bytes[body_end + 2],
        bytes[body_end + 3],
    ]);
    let actual_crc = crc32fast::hash(body);
    if stored_crc != actual_crc {
        return Err(KolibriError::Serialization(format!(
            "catalog checksum mismatch: stored {:08x}, computed {:08x}",
            stored_crc, actual_crc
        )));
    }

    bincode::deserialize(body).map_err(|e| KolibriError::Serialization(format!("catalog: {}", e)))
}

/// Write the snapshot to a temporary sibling and rename it into place
fn write_snapshot(path: &Path, state: &CatalogState) -> Result<()> {
    let bytes = encode_snapshot(state)?;
    let tmp = path.with_extension("tmp");

    {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    debug!(bytes = bytes.len(), "catalog snapshot written");
    Ok(())
}
