//! Tests for the formula (run-length) codec
//!
//! These tests verify:
//! - Exact round-trip for edge-case and random buffers
//! - Escape handling for the reserved 0xFF byte
//! - Run token layout and the 255 cap
//! - Pass-through of unframed input
//! - Rejection of truncated token streams

use kolibri_store::codec::formula::{self, ESCAPE, MAX_RUN};
use kolibri_store::codec::FORMULA_MAGIC;
use kolibri_store::KolibriError;
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn round_trip(data: &[u8]) -> Vec<u8> {
    let encoded = formula::encode(data);
    formula::decode(&encoded).unwrap()
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_empty() {
    let encoded = formula::encode(&[]);
    assert_eq!(encoded, FORMULA_MAGIC.to_vec());
    assert_eq!(formula::decode(&encoded).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_round_trip_all_zero() {
    let data = vec![0u8; 10_000];
    assert_eq!(round_trip(&data), data);
}

#[test]
fn test_round_trip_no_repetition() {
    let data: Vec<u8> = (0u8..=254).collect();
    let encoded = formula::encode(&data);
    // Only literals: magic + one byte per input byte
    assert_eq!(encoded.len(), 4 + data.len());
    assert_eq!(formula::decode(&encoded).unwrap(), data);
}

#[test]
fn test_round_trip_text() {
    let data = "Hello, Cloud Storage! 🚀".as_bytes();
    assert_eq!(round_trip(data), data);
}

#[test]
fn test_round_trip_mixed_runs_and_escapes() {
    let mut data = Vec::new();
    data.extend_from_slice(&[1, 1, 1, 1]);
    data.extend_from_slice(&[ESCAPE, 2, ESCAPE]);
    data.extend_from_slice(&[3; 700]);
    data.extend_from_slice(b"tail");
    data.extend_from_slice(&[ESCAPE; 5]);
    assert_eq!(round_trip(&data), data);
}

#[test]
fn test_round_trip_input_that_looks_like_tokens() {
    // Literal bytes that collide with the magic and run token layout
    let data = b"KOLI\x00\x03\x07KOLI".to_vec();
    assert_eq!(round_trip(&data), data);
}

// =============================================================================
// Escape Tests
// =============================================================================

#[test]
fn test_escape_runs_of_ff() {
    for k in [1usize, 2, 3, 4, 255, 256, 1000] {
        let data = vec![ESCAPE; k];
        let encoded = formula::encode(&data);
        assert_eq!(encoded.len(), 4 + 2 * k, "k = {}", k);
        assert_eq!(formula::decode(&encoded).unwrap(), data, "k = {}", k);
    }
}

#[test]
fn test_escape_never_appears_unescaped() {
    let data = vec![ESCAPE, 0x00, ESCAPE, ESCAPE, 0x10];
    let encoded = formula::encode(&data);
    let stream = &encoded[4..];

    let mut pos = 0;
    while pos < stream.len() {
        if stream[pos] == ESCAPE {
            assert!(pos + 1 < stream.len());
            pos += if stream[pos + 1] == 0 { 2 } else { 3 };
        } else {
            pos += 1;
        }
    }
    assert_eq!(pos, stream.len());
}

// =============================================================================
// Run Token Tests
// =============================================================================

#[test]
fn test_run_of_three_is_tokenized() {
    let encoded = formula::encode(&[5, 5, 5]);
    assert_eq!(&encoded[4..], &[ESCAPE, 3, 5]);
}

#[test]
fn test_run_cap() {
    let data = vec![8u8; MAX_RUN * 2 + 1];
    let encoded = formula::encode(&data);
    // Two full tokens plus a single trailing literal
    assert_eq!(&encoded[4..], &[ESCAPE, 255, 8, ESCAPE, 255, 8, 8]);
    assert_eq!(formula::decode(&encoded).unwrap(), data);
}

#[test]
fn test_runs_shrink_output() {
    let data = vec![42u8; 4096];
    let encoded = formula::encode(&data);
    assert!(encoded.len() < 64);
}

// =============================================================================
// Decode Edge Cases
// =============================================================================

#[test]
fn test_decode_without_magic_passes_through() {
    assert_eq!(formula::decode(b"").unwrap(), b"");
    assert_eq!(formula::decode(b"KOL").unwrap(), b"KOL");
    assert_eq!(formula::decode(b"raw bytes \xFF").unwrap(), b"raw bytes \xFF");
}

#[test]
fn test_decode_dangling_escape() {
    let result = formula::decode(b"KOLIab\xFF");
    assert!(matches!(result, Err(KolibriError::Codec(_))));
}

#[test]
fn test_decode_run_missing_value() {
    let result = formula::decode(b"KOLI\xFF\x09");
    assert!(matches!(result, Err(KolibriError::Codec(_))));
}

#[test]
fn test_max_encoded_len_bounds_worst_case() {
    let data = vec![ESCAPE; 333];
    assert!(formula::encode(&data).len() <= formula::max_encoded_len(data.len()));
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_round_trip_random(data in prop::collection::vec(any::<u8>(), 0..20_000)) {
        let encoded = formula::encode(&data);
        prop_assert!(encoded.len() <= formula::max_encoded_len(data.len()));
        prop_assert_eq!(formula::decode(&encoded).unwrap(), data);
    }

    #[test]
    fn prop_round_trip_repetitive(
        runs in prop::collection::vec((any::<u8>(), 1usize..600), 0..40)
    ) {
        let data: Vec<u8> = runs
            .iter()
            .flat_map(|&(b, n)| std::iter::repeat(b).take(n))
            .collect();
        prop_assert_eq!(formula::decode(&formula::encode(&data)).unwrap(), data);
    }
}
