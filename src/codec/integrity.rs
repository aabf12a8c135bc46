//! Content digests for end-to-end verification

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// True if `data` hashes to `expected` (hex, case-insensitive)
pub fn verify_hash(data: &[u8], expected: &str) -> bool {
    content_hash(data).eq_ignore_ascii_case(expected)
}
