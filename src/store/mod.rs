//! Store Module
//!
//! Collaborator interfaces the pipeline persists through, plus the
//! in-process and on-disk implementations shipped with the crate.
//!
//! ## Responsibilities
//! - `ObjectStore`: framed blobs by key (`<uuid>.kolibri`)
//! - `UserDirectory`: per-owner quota state
//! - `RecordStore`: file records by id
//!
//! ## Catalog Snapshot Format
//! ```text
//! ┌──────────┬────────────┬──────────────────────┬───────────┐
//! │Magic (4) │Version (2) │ Body (bincode)       │ CRC32 (4) │
//! └──────────┴────────────┴──────────────────────┴───────────┘
//! ```

mod catalog;
mod object;

pub use catalog::Catalog;
pub use object::{FsObjectStore, MemoryObjectStore};

use bytes::Bytes;

use crate::error::Result;
use crate::record::{FileRecord, QuotaState};

/// Blob persistence keyed by an opaque string
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous blob
    fn put(&self, key: &str, bytes: Bytes) -> Result<()>;

    /// Fetch the blob under `key`; `NotFound` if absent
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Remove the blob under `key`; `NotFound` if absent
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;
}

/// Quota state per owner
pub trait UserDirectory: Send + Sync {
    /// Create an account; `UserExists` if the owner is already known
    fn register(&self, owner_id: &str, quota: QuotaState) -> Result<()>;

    /// Current quota; `NotFound` for unknown owners
    fn get_quota(&self, owner_id: &str) -> Result<QuotaState>;

    /// Overwrite an existing owner's quota
    fn persist_quota(&self, owner_id: &str, quota: QuotaState) -> Result<()>;
}

/// File records by id
pub trait RecordStore: Send + Sync {
    fn insert_record(&self, record: FileRecord) -> Result<()>;

    fn get_record(&self, file_id: &str) -> Result<Option<FileRecord>>;

    /// Remove and return the record, if present
    fn remove_record(&self, file_id: &str) -> Result<Option<FileRecord>>;

    /// All records of one owner, oldest upload first
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>>;
}
