//! Codec Module
//!
//! Two-stage lossless codec and the framing around it.
//!
//! ## Responsibilities
//! - Sample the input for repeated sequences (statistics only)
//! - Run-length encode with a reserved escape byte
//! - Deflate the token stream
//! - Frame the result with size/pattern/version metadata
//! - Digest original bytes for end-to-end verification
//!
//! ## Stage Order
//! ```text
//!   original ──► PatternAnalyzer ──► formula::encode ──► deflate ──► envelope
//!                  (patterns)          ("KOLI" + tokens)
//!
//!   envelope ──► decode_envelope ──► inflate ──► formula::decode ──► original
//! ```

mod deflate;
mod envelope;
pub mod formula;
mod integrity;
mod pattern;

pub use deflate::{GenericCompressor, DEFAULT_LEVEL};
pub use envelope::{decode_envelope, encode_envelope, EnvelopeMetadata, LENGTH_PREFIX_SIZE};
pub use integrity::{content_hash, verify_hash};
pub use pattern::{
    Pattern, PatternAnalysis, PatternAnalyzer, MAX_PATTERN_LEN, MAX_REPORTED, MAX_TRACKED,
    MIN_PATTERN_LEN,
};

use tracing::debug;

use crate::error::Result;

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes opening every formula token stream ("KOLI")
pub const FORMULA_MAGIC: &[u8; 4] = b"KOLI";

/// Human-readable codec name
pub const ALGORITHM: &str = "Kolibri DECIMAL10X v1.0";

// =============================================================================
// Composite Codec
// =============================================================================

/// Output of [`KolibriCodec::compress`]
#[derive(Debug, Clone)]
pub struct CompressedObject {
    /// Fully framed envelope, ready to store
    pub blob: Vec<u8>,
    /// Metadata written into the envelope
    pub metadata: EnvelopeMetadata,
}

impl CompressedObject {
    /// Stored size as a percentage of the original, rounded to 2 decimals.
    /// Zero for an empty original.
    pub fn ratio(&self) -> f64 {
        compression_ratio(self.blob.len() as u64, self.metadata.original)
    }
}

/// Analyzer + formula stage + deflate + envelope
#[derive(Debug, Clone)]
pub struct KolibriCodec {
    analyzer: PatternAnalyzer,
    compressor: GenericCompressor,
    version: String,
}

impl Default for KolibriCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL, "1.0.0")
    }
}

impl KolibriCodec {
    pub fn new(level: u32, version: impl Into<String>) -> Self {
        Self {
            analyzer: PatternAnalyzer::new(),
            compressor: GenericCompressor::new(level),
            version: version.into(),
        }
    }

    /// Compress `data` into a framed envelope stamped with `timestamp`
    pub fn compress(&self, data: &[u8], timestamp: u64) -> Result<CompressedObject> {
        let analysis = self.analyzer.analyze(data);
        debug!(
            patterns = analysis.pattern_count(),
            tracked = analysis.tracked,
            step = analysis.sample_step,
            "analyzed"
        );

        let encoded = formula::encode(data);
        debug!(bytes = encoded.len(), "formula encoded");

        let payload = self.compressor.compress(&encoded)?;
        debug!(bytes = payload.len(), "deflated");

        let metadata = EnvelopeMetadata {
            original: data.len() as u64,
            compressed: payload.len() as u64,
            patterns: analysis.pattern_count() as u64,
            timestamp,
            version: self.version.clone(),
        };
        let blob = encode_envelope(&metadata, &payload)?;

        Ok(CompressedObject { blob, metadata })
    }

    /// Reverse [`compress`](Self::compress). Sizes are not checked here.
    pub fn decompress(&self, blob: &[u8]) -> Result<(Vec<u8>, EnvelopeMetadata)> {
        let (metadata, payload) = decode_envelope(blob)?;

        let bound = usize::try_from(metadata.original)
            .map(formula::max_encoded_len)
            .unwrap_or(usize::MAX);
        let encoded = self.compressor.decompress_bounded(payload, bound)?;
        let data = formula::decode(&encoded)?;

        Ok((data, metadata))
    }

    pub fn level(&self) -> u32 {
        self.compressor.level()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Describe the codec
    pub fn stats(&self) -> CodecStats {
        CodecStats {
            algorithm: ALGORITHM,
            compression_level: self.level(),
            version: self.version.clone(),
            features: &[
                "Pattern Detection (DECIMAL10X)",
                "Formula Encoding",
                "Entropy Coding",
                "Integrity Checking",
            ],
        }
    }
}

/// Static description of the codec configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CodecStats {
    pub algorithm: &'static str,
    pub compression_level: u32,
    pub version: String,
    pub features: &'static [&'static str],
}

/// `stored / original * 100`, rounded to 2 decimals; 0 when `original` is 0
pub fn compression_ratio(stored: u64, original: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (stored as f64 / original as f64 * 10_000.0).round() / 100.0
}
