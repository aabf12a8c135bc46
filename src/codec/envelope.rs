//! Envelope
//!
//! Length-prefixed metadata block followed by the compressed payload.
//!
//! ```text
//! ┌────────────────┬──────────────────────────┬────────────────────┐
//! │ MetaLen u32 BE │ Metadata (JSON, MetaLen) │ Payload (deflate)  │
//! └────────────────┴──────────────────────────┴────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EnvelopeError, KolibriError, Result};

/// Size of the metadata length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Metadata stored in front of every payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    /// Size of the original bytes
    pub original: u64,
    /// Size of the payload that follows the metadata block
    pub compressed: u64,
    /// Number of patterns the analyzer reported
    pub patterns: u64,
    /// Creation time (unix millis)
    pub timestamp: u64,
    /// Codec version that produced the envelope
    pub version: String,
}

/// Frame `payload` behind `metadata`
pub fn encode_envelope(metadata: &EnvelopeMetadata, payload: &[u8]) -> Result<Vec<u8>> {
    let meta = serde_json::to_vec(metadata)
        .map_err(|e| KolibriError::Serialization(format!("envelope metadata: {}", e)))?;

    let meta_len = u32::try_from(meta.len()).map_err(|_| {
        KolibriError::Serialization(format!("metadata block too large: {} bytes", meta.len()))
    })?;

    let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + meta.len() + payload.len());
    out.extend_from_slice(&meta_len.to_be_bytes());
    out.extend_from_slice(&meta);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Split an envelope into its metadata and payload
///
/// The metadata length must exactly bound the metadata block and the
/// payload length must match what the metadata records.
pub fn decode_envelope(bytes: &[u8]) -> std::result::Result<(EnvelopeMetadata, &[u8]), EnvelopeError> {
    if bytes.len() < LENGTH_PREFIX_SIZE {
        return Err(EnvelopeError::Truncated {
            needed: LENGTH_PREFIX_SIZE,
            available: bytes.len(),
        });
    }

    let meta_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let meta_end = LENGTH_PREFIX_SIZE
        .checked_add(meta_len)
        .ok_or(EnvelopeError::Truncated {
            needed: usize::MAX,
            available: bytes.len(),
        })?;

    if meta_end > bytes.len() {
        return Err(EnvelopeError::Truncated {
            needed: meta_end,
            available: bytes.len(),
        });
    }

    let metadata: EnvelopeMetadata = serde_json::from_slice(&bytes[LENGTH_PREFIX_SIZE..meta_end])
        .map_err(|e| EnvelopeError::InvalidMetadata(e.to_string()))?;

    let payload = &bytes[meta_end..];
    if payload.len() as u64 != metadata.compressed {
        return Err(EnvelopeError::PayloadSizeMismatch {
            recorded: metadata.compressed,
            actual: payload.len() as u64,
        });
    }

    Ok((metadata, payload))
}
