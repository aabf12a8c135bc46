//! Error types for Kolibri Store
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KolibriError
pub type Result<T> = std::result::Result<T, KolibriError>;

/// Unified error type for Kolibri Store operations
#[derive(Debug, Error)]
pub enum KolibriError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    StorageIo(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    // -------------------------------------------------------------------------
    // Quota / Admission Errors
    // -------------------------------------------------------------------------
    #[error("Storage limit exceeded: {available} bytes available, {required} required")]
    QuotaExceeded { available: u64, required: u64 },

    #[error("Payload too large: {size} bytes (max {limit})")]
    PayloadTooLarge { size: u64, limit: u64 },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures while framing or unframing a stored blob
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("truncated envelope: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("invalid metadata block: {0}")]
    InvalidMetadata(String),

    #[error("payload size mismatch: metadata records {recorded} bytes, found {actual}")]
    PayloadSizeMismatch { recorded: u64, actual: u64 },
}

impl KolibriError {
    /// True for conditions the caller caused and can act on
    /// (over quota, oversized upload, unknown file).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            KolibriError::QuotaExceeded { .. }
                | KolibriError::PayloadTooLarge { .. }
                | KolibriError::NotFound(_)
                | KolibriError::UserExists(_)
        )
    }
}
