//! Record types
//!
//! File metadata and per-owner quota state kept by the catalog.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Suffix of every blob key in the object store
pub const BLOB_SUFFIX: &str = ".kolibri";

/// Metadata for one stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque unique id handed to callers
    pub id: String,
    pub owner_id: String,
    pub original_name: String,
    pub mime_type: String,
    /// Upload time (unix millis)
    pub uploaded_at: u64,
    pub original_size: u64,
    /// Size of the stored envelope; what the owner is charged
    pub compressed_size: u64,
    /// `compressed_size / original_size * 100`, 2 decimals
    pub compression_ratio: f64,
    /// Hex SHA-256 of the original bytes
    pub content_hash: String,
    pub codec_version: String,
    /// Object store key (`<uuid>.kolibri`)
    pub blob_ref: String,
    /// Patterns reported by the analyzer at upload time
    pub pattern_count: u64,
}

impl FileRecord {
    /// Bytes saved by compression (negative when the envelope is larger)
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.compressed_size as i64
    }
}

/// Byte accounting for one owner
///
/// Invariant: `used <= limit` between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub used: u64,
    pub limit: u64,
}

impl QuotaState {
    /// Fresh account with nothing stored
    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    /// Remaining capacity
    pub fn available(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    /// Usage as a rounded whole percentage
    pub fn usage_percent(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        (self.used as f64 / self.limit as f64 * 100.0).round() as u64
    }
}

/// Aggregate view over an owner's files
#[derive(Debug, Clone, PartialEq)]
pub struct StorageInfo {
    pub owner_id: String,
    pub quota: QuotaState,
    pub file_count: usize,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
    pub total_saved: i64,
    /// Total compressed / total original * 100, 2 decimals; 0 with no files
    pub average_compression_ratio: f64,
    pub usage_percent: u64,
}

/// Current time in unix milliseconds
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
