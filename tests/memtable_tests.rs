//! MemTable Tests
//!
//! Tests verify:
//! - Basic put/get/overwrite
//! - Size tracking across overwrites and tombstones
//! - Sorted snapshot iteration
//! - Ordered key lookup for cursors

use std::sync::Arc;
use std::thread;

use spacekv::memtable::{MemTable, MemTableEntry};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::new();
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
    assert!(memtable.is_empty());
}

#[test]
fn test_put_and_get() {
    let memtable = MemTable::new();
    memtable.put(b"users:1".to_vec(), b"alice".to_vec());

    assert_eq!(
        memtable.get(b"users:1"),
        Some(MemTableEntry::Value(b"alice".to_vec()))
    );
    assert_eq!(memtable.get(b"users:2"), None);
}

#[test]
fn test_put_overwrites_existing() {
    let memtable = MemTable::new();
    memtable.put(b"k".to_vec(), b"v1".to_vec());
    memtable.put(b"k".to_vec(), b"v2".to_vec());

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"k"), Some(MemTableEntry::Value(b"v2".to_vec())));
}

// =============================================================================
// Delete / Tombstone Tests
// =============================================================================

#[test]
fn test_delete_creates_tombstone() {
    let memtable = MemTable::new();
    memtable.put(b"k".to_vec(), b"v".to_vec());
    memtable.delete(b"k".to_vec());

    assert_eq!(memtable.get(b"k"), Some(MemTableEntry::Tombstone));
    assert_eq!(memtable.entry_count(), 1); // Tombstone still counts as entry
}

#[test]
fn test_delete_missing_key_still_records_tombstone() {
    let memtable = MemTable::new();
    memtable.delete(b"ghost".to_vec());

    assert_eq!(memtable.get(b"ghost"), Some(MemTableEntry::Tombstone));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracks_keys_and_values() {
    let memtable = MemTable::new();

    let size = memtable.put(b"abc".to_vec(), b"12345".to_vec());
    assert_eq!(size, 8);
    assert_eq!(memtable.size(), 8);

    // Overwrite replaces the old value's contribution
    let size = memtable.put(b"abc".to_vec(), b"1".to_vec());
    assert_eq!(size, 4);

    // Tombstone keeps only the key
    let size = memtable.delete(b"abc".to_vec());
    assert_eq!(size, 3);
}

#[test]
fn test_should_flush() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), vec![0u8; 97]);

    assert!(memtable.should_flush(100));
    assert!(!memtable.should_flush(101));
}

#[test]
fn test_clear_resets_everything() {
    let memtable = MemTable::new();
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());
    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.get(b"a"), None);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_iter_is_sorted_snapshot() {
    let memtable = MemTable::new();
    memtable.put(b"c".to_vec(), b"3".to_vec());
    memtable.put(b"a".to_vec(), b"1".to_vec());
    memtable.delete(b"b".to_vec());

    let iter = memtable.iter();
    // Later writes do not reach an existing snapshot
    memtable.put(b"d".to_vec(), b"4".to_vec());

    let entries: Vec<_> = iter.collect();
    assert_eq!(
        entries,
        vec![
            (b"a".to_vec(), MemTableEntry::Value(b"1".to_vec())),
            (b"b".to_vec(), MemTableEntry::Tombstone),
            (b"c".to_vec(), MemTableEntry::Value(b"3".to_vec())),
        ]
    );
}

#[test]
fn test_first_key_after() {
    let memtable = MemTable::new();
    memtable.put(b"ks:1".to_vec(), b"x".to_vec());
    memtable.put(b"ks:3".to_vec(), b"x".to_vec());
    memtable.delete(b"ks:2".to_vec());

    assert_eq!(memtable.first_key_after(None), Some(b"ks:1".to_vec()));
    // Tombstoned keys are still reported; callers resolve them
    assert_eq!(memtable.first_key_after(Some(b"ks:1".as_slice())), Some(b"ks:2".to_vec()));
    assert_eq!(memtable.first_key_after(Some(b"ks:25".as_slice())), Some(b"ks:3".to_vec()));
    assert_eq!(memtable.first_key_after(Some(b"ks:3".as_slice())), None);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let memtable = Arc::new(MemTable::new());
    memtable.put(b"stable".to_vec(), b"v".to_vec());

    let writer = {
        let memtable = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 0..500 {
                memtable.put(format!("k{:04}", i).into_bytes(), b"v".to_vec());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let memtable = Arc::clone(&memtable);
            thread::spawn(move || {
                for _ in 0..500 {
                    assert!(memtable.get(b"stable").is_some());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 501);
}
