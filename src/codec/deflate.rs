//! Generic Compressor
//!
//! zlib-framed deflate applied after the formula stage.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{KolibriError, Result};

/// Default deflate level (best compression)
pub const DEFAULT_LEVEL: u32 = 9;

/// Deflate compressor with a fixed level
#[derive(Debug, Clone, Copy)]
pub struct GenericCompressor {
    level: Compression,
}

impl Default for GenericCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl GenericCompressor {
    /// Create a compressor; `level` is clamped into `1..=9`
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.clamp(1, 9)),
        }
    }

    /// Effective compression level
    pub fn level(&self) -> u32 {
        self.level.level()
    }

    /// Compress `data`
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), self.level);
        encoder
            .write_all(data)
            .map_err(|e| KolibriError::Codec(format!("deflate failed: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| KolibriError::Codec(format!("deflate failed: {}", e)))
    }

    /// Decompress `data` with no output bound
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::with_capacity(data.len() * 2);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| KolibriError::Codec(format!("inflate failed: {}", e)))?;
        Ok(out)
    }

    /// Decompress `data`, failing if the output would exceed `max_len` bytes
    pub fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        let limit = (max_len as u64).saturating_add(1);
        let mut decoder = ZlibDecoder::new(data).take(limit);
        let mut out = Vec::with_capacity(max_len.min(data.len().saturating_mul(4)));
        decoder
            .read_to_end(&mut out)
            .map_err(|e| KolibriError::Codec(format!("inflate failed: {}", e)))?;

        if out.len() > max_len {
            return Err(KolibriError::Codec(format!(
                "inflated stream exceeds {} bytes",
                max_len
            )));
        }
        Ok(out)
    }
}
