//! Tests for Catalog
//!
//! These tests verify:
//! - User registration and quota persistence
//! - Record insert/get/remove/list
//! - Snapshot persistence across reopen
//! - Corruption detection on open

use kolibri_store::store::{Catalog, RecordStore, UserDirectory};
use kolibri_store::{FileRecord, KolibriError, QuotaState};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn record(id: &str, owner: &str, uploaded_at: u64) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        owner_id: owner.to_string(),
        original_name: format!("{}.txt", id),
        mime_type: "text/plain".to_string(),
        uploaded_at,
        original_size: 100,
        compressed_size: 60,
        compression_ratio: 60.0,
        content_hash: "00".repeat(32),
        codec_version: "1.0.0".to_string(),
        blob_ref: format!("{}.kolibri", id),
        pattern_count: 0,
    }
}

// =============================================================================
// User Directory Tests
// =============================================================================

#[test]
fn test_register_and_get_quota() {
    let catalog = Catalog::in_memory();
    catalog.register("alice", QuotaState::new(500)).unwrap();

    let quota = catalog.get_quota("alice").unwrap();
    assert_eq!(quota, QuotaState { used: 0, limit: 500 });
}

#[test]
fn test_register_twice_fails() {
    let catalog = Catalog::in_memory();
    catalog.register("alice", QuotaState::new(500)).unwrap();

    assert!(matches!(
        catalog.register("alice", QuotaState::new(1)),
        Err(KolibriError::UserExists(_))
    ));
    assert_eq!(catalog.get_quota("alice").unwrap().limit, 500);
}

#[test]
fn test_persist_quota_unknown_owner() {
    let catalog = Catalog::in_memory();
    assert!(matches!(
        catalog.persist_quota("ghost", QuotaState::new(1)),
        Err(KolibriError::NotFound(_))
    ));
    assert!(matches!(catalog.get_quota("ghost"), Err(KolibriError::NotFound(_))));
}

// =============================================================================
// Record Store Tests
// =============================================================================

#[test]
fn test_insert_get_remove_record() {
    let catalog = Catalog::in_memory();
    let rec = record("f1", "alice", 1);

    catalog.insert_record(rec.clone()).unwrap();
    assert_eq!(catalog.get_record("f1").unwrap(), Some(rec.clone()));

    assert_eq!(catalog.remove_record("f1").unwrap(), Some(rec));
    assert_eq!(catalog.get_record("f1").unwrap(), None);
    assert_eq!(catalog.remove_record("f1").unwrap(), None);
}

#[test]
fn test_duplicate_record_id_rejected() {
    let catalog = Catalog::in_memory();
    catalog.insert_record(record("f1", "alice", 1)).unwrap();
    assert!(catalog.insert_record(record("f1", "bob", 2)).is_err());
    assert_eq!(catalog.get_record("f1").unwrap().unwrap().owner_id, "alice");
}

#[test]
fn test_list_by_owner_sorted_by_upload_time() {
    let catalog = Catalog::in_memory();
    catalog.insert_record(record("c", "alice", 30)).unwrap();
    catalog.insert_record(record("a", "alice", 10)).unwrap();
    catalog.insert_record(record("x", "bob", 5)).unwrap();
    catalog.insert_record(record("b", "alice", 20)).unwrap();

    let ids: Vec<String> = catalog
        .list_by_owner("alice")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(catalog.list_by_owner("nobody").unwrap().is_empty());
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_snapshot_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.bin");

    {
        let catalog = Catalog::open(&path).unwrap();
        catalog.register("alice", QuotaState::new(1000)).unwrap();
        catalog.persist_quota("alice", QuotaState { used: 60, limit: 1000 }).unwrap();
        catalog.insert_record(record("f1", "alice", 1)).unwrap();
    }

    assert!(path.exists());
    let catalog = Catalog::open(&path).unwrap();
    assert_eq!(catalog.get_quota("alice").unwrap().used, 60);
    assert_eq!(catalog.get_record("f1").unwrap().unwrap().compressed_size, 60);
    assert_eq!(catalog.user_count(), 1);
    assert_eq!(catalog.file_count(), 1);
}

#[test]
fn test_open_missing_snapshot_starts_empty() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sub").join("catalog.bin");

    let catalog = Catalog::open(&path).unwrap();

    assert_eq!(catalog.user_count(), 0);
    assert_eq!(catalog.snapshot_path(), Some(path.as_path()));
}

#[test]
fn test_corrupted_snapshot_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.bin");

    {
        let catalog = Catalog::open(&path).unwrap();
        catalog.register("alice", QuotaState::new(1000)).unwrap();
    }

    let mut bytes = std::fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        Catalog::open(&path),
        Err(KolibriError::Serialization(_))
    ));
}

#[test]
fn test_bad_magic_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.bin");
    std::fs::write(&path, b"NOPE\x01\x00\x00\x00\x00\x00\x00\x00").unwrap();

    assert!(matches!(
        Catalog::open(&path),
        Err(KolibriError::Serialization(_))
    ));
}
