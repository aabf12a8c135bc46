//! Tests for ObjectStore implementations
//!
//! These tests verify:
//! - put/get/delete/exists on memory and filesystem stores
//! - NotFound for missing blobs
//! - Key validation on the filesystem store
//! - Persistence across reopen

use bytes::Bytes;
use kolibri_store::store::{FsObjectStore, MemoryObjectStore, ObjectStore};
use kolibri_store::KolibriError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn exercise_store(store: &dyn ObjectStore) {
    assert!(!store.exists("a.kolibri").unwrap());

    store.put("a.kolibri", Bytes::from_static(b"first")).unwrap();
    assert!(store.exists("a.kolibri").unwrap());
    assert_eq!(store.get("a.kolibri").unwrap(), Bytes::from_static(b"first"));

    // Overwrite
    store.put("a.kolibri", Bytes::from_static(b"second")).unwrap();
    assert_eq!(store.get("a.kolibri").unwrap(), Bytes::from_static(b"second"));

    store.delete("a.kolibri").unwrap();
    assert!(!store.exists("a.kolibri").unwrap());
    assert!(matches!(store.get("a.kolibri"), Err(KolibriError::NotFound(_))));
    assert!(matches!(store.delete("a.kolibri"), Err(KolibriError::NotFound(_))));
}

// =============================================================================
// Memory Store Tests
// =============================================================================

#[test]
fn test_memory_store_operations() {
    let store = MemoryObjectStore::new();
    exercise_store(&store);
    assert!(store.is_empty());
}

#[test]
fn test_memory_store_len() {
    let store = MemoryObjectStore::new();
    store.put("x", Bytes::from_static(b"1")).unwrap();
    store.put("y", Bytes::from_static(b"2")).unwrap();
    assert_eq!(store.len(), 2);
}

// =============================================================================
// Filesystem Store Tests
// =============================================================================

#[test]
fn test_fs_store_operations() {
    let temp = TempDir::new().unwrap();
    let store = FsObjectStore::open(&temp.path().join("blobs")).unwrap();
    exercise_store(&store);
}

#[test]
fn test_fs_store_creates_directory() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("nested").join("blobs");

    let store = FsObjectStore::open(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(store.root(), root.as_path());
}

#[test]
fn test_fs_store_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("blobs");

    {
        let store = FsObjectStore::open(&root).unwrap();
        store.put("kept.kolibri", Bytes::from(vec![7u8; 4096])).unwrap();
    }

    let store = FsObjectStore::open(&root).unwrap();
    assert_eq!(store.get("kept.kolibri").unwrap().len(), 4096);
}

#[test]
fn test_fs_store_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("blobs");
    let store = FsObjectStore::open(&root).unwrap();

    store.put("one.kolibri", Bytes::from_static(b"1")).unwrap();
    store.put("two.kolibri", Bytes::from_static(b"2")).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["one.kolibri", "two.kolibri"]);
}

#[test]
fn test_fs_store_rejects_path_keys() {
    let temp = TempDir::new().unwrap();
    let store = FsObjectStore::open(&temp.path().join("blobs")).unwrap();

    for key in ["", "..", "../escape", "dir/file", ".hidden", "a\\b"] {
        assert!(
            matches!(
                store.put(key, Bytes::from_static(b"x")),
                Err(KolibriError::StorageIo(_))
            ),
            "key {:?} should be rejected",
            key
        );
    }
}
