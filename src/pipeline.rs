//! Pipeline Module
//!
//! Upload, download and delete orchestration over the codec, the quota
//! ledger and the stores.
//!
//! ## Responsibilities
//! - Run the codec stages strictly in order for each unit of work
//! - Charge quota before a blob becomes visible, refund on any later failure
//! - Verify size and digest before handing bytes back
//! - Keep blob, quota and record consistent on delete
//!
//! ## Upload States
//! ```text
//! Received → Analyzed → Encoded → Compressed → Enveloped → Hashed
//!          → QuotaChecked → Persisted
//!                         ↘ Rejected (QuotaExceeded)
//! any stage failure → Failed (no record, no quota change)
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::{self, CodecStats, KolibriCodec};
use crate::config::{Config, IntegrityMode};
use crate::error::{KolibriError, Result};
use crate::quota::QuotaLedger;
use crate::record::{now_millis, FileRecord, QuotaState, StorageInfo, BLOB_SUFFIX};
use crate::store::{Catalog, FsObjectStore, MemoryObjectStore, ObjectStore, RecordStore, UserDirectory};

/// The object pipeline
///
/// ## Concurrency Model
///
/// - Every operation takes `&self`; share the pipeline with `Arc`
/// - Codec stages are pure and run without any lock
/// - Quota changes go through `QuotaLedger`, serialized per owner
/// - Removal holds the owner's ledger lock from blob delete to refund,
///   so two removes of the same file cannot refund it twice
pub struct Pipeline {
    config: Config,
    codec: KolibriCodec,
    objects: Arc<dyn ObjectStore>,
    directory: Arc<dyn UserDirectory>,
    records: Arc<dyn RecordStore>,
    ledger: QuotaLedger,
}

impl Pipeline {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const BLOB_DIR: &'static str = "blobs";
    const CATALOG_FILENAME: &'static str = "catalog.bin";

    /// Open or create an on-disk pipeline under `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let objects = FsObjectStore::open(&config.data_dir.join(Self::BLOB_DIR))?;
        let catalog = Arc::new(Catalog::open(&config.data_dir.join(Self::CATALOG_FILENAME))?);

        info!(
            data_dir = %config.data_dir.display(),
            users = catalog.user_count(),
            files = catalog.file_count(),
            "pipeline opened"
        );

        Ok(Self::with_stores(
            config,
            Arc::new(objects),
            catalog.clone(),
            catalog,
        ))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Pipeline with nothing on disk
    pub fn in_memory(config: Config) -> Self {
        let catalog = Arc::new(Catalog::in_memory());
        Self::with_stores(
            config,
            Arc::new(MemoryObjectStore::new()),
            catalog.clone(),
            catalog,
        )
    }

    /// Assemble a pipeline from caller-provided collaborators
    pub fn with_stores(
        config: Config,
        objects: Arc<dyn ObjectStore>,
        directory: Arc<dyn UserDirectory>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let codec = KolibriCodec::new(config.compression_level, config.codec_version.clone());
        let ledger = QuotaLedger::new(Arc::clone(&directory));
        Self {
            config,
            codec,
            objects,
            directory,
            records,
            ledger,
        }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create an account with `used = 0`; the configured default limit
    /// applies when `limit` is `None`
    pub fn register_user(&self, owner_id: &str, limit: Option<u64>) -> Result<QuotaState> {
        let quota = QuotaState::new(limit.unwrap_or(self.config.default_quota_limit));
        self.directory.register(owner_id, quota)?;
        info!(owner = owner_id, limit = quota.limit, "user registered");
        Ok(quota)
    }

    /// Current quota of `owner_id`
    pub fn quota(&self, owner_id: &str) -> Result<QuotaState> {
        self.ledger.quota(owner_id)
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Compress, frame, charge and persist `data`
    ///
    /// All-or-nothing: on any error no record exists and the owner's quota
    /// is what it was before the call.
    #[instrument(skip(self, data), fields(owner = owner_id, bytes = data.len()))]
    pub fn upload(
        &self,
        owner_id: &str,
        data: &[u8],
        mime_type: &str,
        original_name: &str,
    ) -> Result<FileRecord> {
        let size = data.len() as u64;
        if size > self.config.max_upload_size {
            return Err(KolibriError::PayloadTooLarge {
                size,
                limit: self.config.max_upload_size,
            });
        }

        // Unknown owners fail before any codec work
        self.directory.get_quota(owner_id)?;

        // Analyzed → Encoded → Compressed → Enveloped
        let uploaded_at = now_millis();
        let compressed = self.codec.compress(data, uploaded_at)?;
        let compressed_size = compressed.blob.len() as u64;
        let ratio = compressed.ratio();

        // Hashed
        let content_hash = codec::content_hash(data);

        // QuotaChecked
        match self.ledger.reserve(owner_id, compressed_size) {
            Ok(_) => {}
            Err(e @ KolibriError::QuotaExceeded { .. }) => {
                info!(error = %e, "upload rejected");
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        // Persisted
        let file_id = uuid::Uuid::new_v4().to_string();
        let blob_ref = format!("{}{}", uuid::Uuid::new_v4(), BLOB_SUFFIX);

        if let Err(e) = self.objects.put(&blob_ref, Bytes::from(compressed.blob)) {
            error!(error = %e, blob = %blob_ref, "blob write failed");
            self.refund(owner_id, compressed_size);
            return Err(e);
        }

        let record = FileRecord {
            id: file_id,
            owner_id: owner_id.to_string(),
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            uploaded_at,
            original_size: size,
            compressed_size,
            compression_ratio: ratio,
            content_hash,
            codec_version: compressed.metadata.version,
            blob_ref,
            pattern_count: compressed.metadata.patterns,
        };

        if let Err(e) = self.records.insert_record(record.clone()) {
            error!(error = %e, "record insert failed");
            if let Err(cleanup) = self.objects.delete(&record.blob_ref) {
                warn!(error = %cleanup, blob = %record.blob_ref, "orphaned blob");
            }
            self.refund(owner_id, compressed_size);
            return Err(e);
        }

        info!(
            file_id = %record.id,
            original = record.original_size,
            stored = record.compressed_size,
            ratio = record.compression_ratio,
            "upload persisted"
        );
        Ok(record)
    }

    /// Undo a reservation after a later stage failed
    fn refund(&self, owner_id: &str, bytes: u64) {
        if let Err(e) = self.ledger.release(owner_id, bytes) {
            error!(error = %e, owner = owner_id, bytes, "quota refund failed");
        }
    }

    // =========================================================================
    // Download
    // =========================================================================

    /// Fetch, unframe, decode and verify a stored object
    ///
    /// Never returns partially decoded bytes.
    #[instrument(skip(self), fields(owner = owner_id, file = file_id))]
    pub fn download(&self, owner_id: &str, file_id: &str) -> Result<Vec<u8>> {
        // Located
        let record = self.owned_record(owner_id, file_id)?;
        let blob = self.objects.get(&record.blob_ref)?;
        debug!(bytes = blob.len(), "blob loaded");

        // EnvelopeParsed → Decompressed → Decoded
        let (data, metadata) = self.codec.decompress(&blob)?;
        debug!(bytes = data.len(), version = %metadata.version, "decoded");

        // Verified
        let actual = data.len() as u64;
        if actual != record.original_size || actual != metadata.original {
            self.integrity_failure(format!(
                "decoded {} bytes, record says {}, envelope says {}",
                actual, record.original_size, metadata.original
            ))?;
        }
        if !codec::verify_hash(&data, &record.content_hash) {
            self.integrity_failure(format!(
                "content hash mismatch for file {}",
                record.id
            ))?;
        }

        // Delivered
        Ok(data)
    }

    fn integrity_failure(&self, message: String) -> Result<()> {
        match self.config.integrity_mode {
            IntegrityMode::Strict => {
                error!(%message, "integrity check failed");
                Err(KolibriError::DataIntegrity(message))
            }
            IntegrityMode::Permissive => {
                warn!(%message, "integrity check failed, returning data anyway");
                Ok(())
            }
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove the blob, drop the record and refund its stored size
    ///
    /// A blob that is already gone counts as removed. Any other blob store
    /// failure leaves quota and record untouched. The refund happens only
    /// once the record is gone, so a failed remove never refunds.
    #[instrument(skip(self), fields(owner = owner_id, file = file_id))]
    pub fn remove(&self, owner_id: &str, file_id: &str) -> Result<QuotaState> {
        self.ledger.with_owner(owner_id, |account| {
            // Located (re-read under the owner lock)
            let record = self.owned_record(owner_id, file_id)?;

            // BlobRemoved
            match self.objects.delete(&record.blob_ref) {
                Ok(()) => {}
                Err(KolibriError::NotFound(_)) => {
                    warn!(blob = %record.blob_ref, "blob already missing");
                }
                Err(e) => return Err(e),
            }

            // RecordRemoved
            self.records.remove_record(&record.id)?;

            // QuotaReleased; a failed refund restores the record
            let quota = match account.release(record.compressed_size) {
                Ok(quota) => quota,
                Err(e) => {
                    error!(error = %e, file_id = %record.id, "quota refund failed");
                    if let Err(restore) = self.records.insert_record(record.clone()) {
                        error!(error = %restore, file_id = %record.id, "record restore failed");
                    }
                    return Err(e);
                }
            };

            info!(freed = record.compressed_size, used = quota.used, "file removed");
            Ok(quota)
        })
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// All files of `owner_id`, oldest first
    pub fn list(&self, owner_id: &str) -> Result<Vec<FileRecord>> {
        self.directory.get_quota(owner_id)?;
        self.records.list_by_owner(owner_id)
    }

    /// Record of one file owned by `owner_id`
    pub fn file(&self, owner_id: &str, file_id: &str) -> Result<FileRecord> {
        self.owned_record(owner_id, file_id)
    }

    /// Quota plus compression totals for `owner_id`
    pub fn storage_info(&self, owner_id: &str) -> Result<StorageInfo> {
        let quota = self.ledger.quota(owner_id)?;
        let files = self.records.list_by_owner(owner_id)?;

        let total_original_size: u64 = files.iter().map(|f| f.original_size).sum();
        let total_compressed_size: u64 = files.iter().map(|f| f.compressed_size).sum();
        let total_saved: i64 = files.iter().map(FileRecord::saved_bytes).sum();

        let average_compression_ratio = if files.is_empty() {
            0.0
        } else {
            codec::compression_ratio(total_compressed_size, total_original_size)
        };

        Ok(StorageInfo {
            owner_id: owner_id.to_string(),
            quota,
            file_count: files.len(),
            total_original_size,
            total_compressed_size,
            total_saved,
            average_compression_ratio,
            usage_percent: quota.usage_percent(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Describe the codec in use
    pub fn codec_stats(&self) -> CodecStats {
        self.codec.stats()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Record lookup scoped to its owner; other owners' files are `NotFound`
    fn owned_record(&self, owner_id: &str, file_id: &str) -> Result<FileRecord> {
        match self.records.get_record(file_id)? {
            Some(record) if record.owner_id == owner_id => Ok(record),
            _ => Err(KolibriError::NotFound(format!("file {}", file_id))),
        }
    }
}
