//! Tests for GenericCompressor
//!
//! These tests verify:
//! - Round-trip at every level
//! - Rejection of malformed streams
//! - Output bound enforcement
//! - Interaction with the formula stage

use kolibri_store::codec::{formula, GenericCompressor};
use kolibri_store::KolibriError;
use proptest::prelude::*;

#[test]
fn test_round_trip_every_level() {
    let data = b"level test data level test data level test data".repeat(50);
    for level in 1..=9 {
        let c = GenericCompressor::new(level);
        let packed = c.compress(&data).unwrap();
        assert_eq!(c.decompress(&packed).unwrap(), data, "level {}", level);
    }
}

#[test]
fn test_round_trip_empty() {
    let c = GenericCompressor::default();
    let packed = c.compress(&[]).unwrap();
    assert!(!packed.is_empty());
    assert_eq!(c.decompress(&packed).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_levels_are_interchangeable_on_decompress() {
    let data = vec![3u8; 5000];
    let packed = GenericCompressor::new(1).compress(&data).unwrap();
    assert_eq!(GenericCompressor::new(9).decompress(&packed).unwrap(), data);
}

#[test]
fn test_malformed_streams() {
    let c = GenericCompressor::default();
    assert!(matches!(c.decompress(b"\x00\x01\x02"), Err(KolibriError::Codec(_))));
    assert!(matches!(c.decompress(b"plain text"), Err(KolibriError::Codec(_))));
}

#[test]
fn test_bounded_decompress_rejects_bombs() {
    let c = GenericCompressor::default();
    let packed = c.compress(&vec![0u8; 1 << 20]).unwrap();
    assert!(packed.len() < 4096);

    let err = c.decompress_bounded(&packed, 1 << 16).unwrap_err();
    assert!(matches!(err, KolibriError::Codec(_)));
}

#[test]
fn test_formula_output_compresses() {
    let data = b"row,1,2,3\n".repeat(2000);
    let encoded = formula::encode(&data);
    let c = GenericCompressor::default();
    let packed = c.compress(&encoded).unwrap();
    assert!(packed.len() < data.len() / 10);
    assert_eq!(formula::decode(&c.decompress(&packed).unwrap()).unwrap(), data);
}

proptest! {
    #[test]
    fn prop_round_trip(data in prop::collection::vec(any::<u8>(), 0..50_000), level in 1u32..=9) {
        let c = GenericCompressor::new(level);
        let packed = c.compress(&data).unwrap();
        prop_assert_eq!(c.decompress(&packed).unwrap(), data);
    }
}
