//! Tests for IndexStore
//!
//! These tests verify:
//! - Lookups before the table exists
//! - Put/retrieve/has, including overwrite
//! - Bulk deletion with absent keys
//! - Persistence across reopen

use std::path::PathBuf;

use casseq::codec::MAX_ENTRY_ID;
use casseq::index::IndexStore;
use casseq::CasseqError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_index() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("index");
    (temp_dir, path)
}

// =============================================================================
// Uninitialized Tests
// =============================================================================

#[test]
fn test_retrieve_before_first_write() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    assert!(matches!(
        index.retrieve(b"anything"),
        Err(CasseqError::NotInitialized)
    ));
}

#[test]
fn test_has_before_first_write() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    assert!(!index.has(b"anything").unwrap());
    assert_eq!(index.len().unwrap(), 0);
    assert!(index.is_empty().unwrap());
}

#[test]
fn test_delete_all_creates_table() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.delete_all([b"ghost".to_vec()]).unwrap();

    // Table exists now, so a miss is an unknown entry
    assert!(matches!(
        index.retrieve(b"ghost"),
        Err(CasseqError::UnknownEntry)
    ));
}

// =============================================================================
// Put / Retrieve Tests
// =============================================================================

#[test]
fn test_put_then_retrieve() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.put(b"alpha", 0).unwrap();
    index.put(b"beta", 1).unwrap();

    assert_eq!(index.retrieve(b"alpha").unwrap(), 0);
    assert_eq!(index.retrieve(b"beta").unwrap(), 1);
    assert!(index.has(b"alpha").unwrap());
    assert_eq!(index.len().unwrap(), 2);
}

#[test]
fn test_retrieve_unknown_entry() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.put(b"alpha", 0).unwrap();

    assert!(matches!(
        index.retrieve(b"gamma"),
        Err(CasseqError::UnknownEntry)
    ));
    assert!(!index.has(b"gamma").unwrap());
}

#[test]
fn test_put_overwrites() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.put(b"key", 3).unwrap();
    index.put(b"key", 70_000).unwrap();

    assert_eq!(index.retrieve(b"key").unwrap(), 70_000);
    assert_eq!(index.len().unwrap(), 1);
}

#[test]
fn test_put_large_ids() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    for (i, id) in [31u64, 32, 1 << 20, 1 << 40, MAX_ENTRY_ID].iter().enumerate() {
        let key = format!("key{}", i);
        index.put(key.as_bytes(), *id).unwrap();
        assert_eq!(index.retrieve(key.as_bytes()).unwrap(), *id);
    }
}

#[test]
fn test_put_unencodable_id_fails() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    assert!(matches!(
        index.put(b"key", u64::MAX),
        Err(CasseqError::IdOverflow(_))
    ));
    assert!(!index.has(b"key").unwrap());
}

#[test]
fn test_binary_keys() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    let key = [0x00, 0xFF, 0x00, 0x01];
    index.put(&key, 9).unwrap();

    assert_eq!(index.retrieve(&key).unwrap(), 9);
    assert!(!index.has(&key[..3]).unwrap());
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_all_removes_keys() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    for i in 0..5u64 {
        index.put(format!("k{}", i).as_bytes(), i).unwrap();
    }

    index
        .delete_all(vec![b"k1".to_vec(), b"k3".to_vec(), b"absent".to_vec()])
        .unwrap();

    assert!(index.has(b"k0").unwrap());
    assert!(!index.has(b"k1").unwrap());
    assert!(index.has(b"k2").unwrap());
    assert!(!index.has(b"k3").unwrap());
    assert!(index.has(b"k4").unwrap());
    assert_eq!(index.len().unwrap(), 3);
}

#[test]
fn test_delete_all_empty_list() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.put(b"k", 0).unwrap();
    index.delete_all(Vec::<Vec<u8>>::new()).unwrap();

    assert!(index.has(b"k").unwrap());
}

// =============================================================================
// Persistence / Lifecycle Tests
// =============================================================================

#[test]
fn test_reopen_keeps_mappings() {
    let (_temp, path) = setup_temp_index();
    {
        let index = IndexStore::open(&path).unwrap();
        index.put(b"persisted", 12).unwrap();
        index.close().unwrap();
    }

    let index = IndexStore::open(&path).unwrap();
    assert_eq!(index.retrieve(b"persisted").unwrap(), 12);
}

#[test]
fn test_size_reports_file_footprint() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.put(b"k", 0).unwrap();

    assert_eq!(
        index.size().unwrap(),
        std::fs::metadata(&path).unwrap().len()
    );
    assert!(index.size().unwrap() > 0);
}

#[test]
fn test_operations_after_close_fail() {
    let (_temp, path) = setup_temp_index();
    let index = IndexStore::open(&path).unwrap();

    index.close().unwrap();

    assert!(matches!(index.has(b"k"), Err(CasseqError::Closed)));
    assert!(matches!(index.retrieve(b"k"), Err(CasseqError::Closed)));
    assert!(matches!(index.put(b"k", 0), Err(CasseqError::Closed)));
    assert!(matches!(index.size(), Err(CasseqError::Closed)));
    assert!(matches!(index.close(), Err(CasseqError::Closed)));
}
