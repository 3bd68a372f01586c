//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::MemTableEntry;

/// In-memory table for recent writes
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, MemTableEntry>>,
    /// Approximate size in bytes (keys + live values)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair (write lock), returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Value(value))
    }

    /// Delete a key (write lock, inserts tombstone), returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        self.insert(key, MemTableEntry::Tombstone)
    }

    fn insert(&self, key: Vec<u8>, entry: MemTableEntry) -> usize {
        let mut data = self.data.write();
        let added = key.len() + entry.value_len();
        let removed = data
            .get(&key)
            .map(|old| key.len() + old.value_len())
            .unwrap_or(0);
        data.insert(key, entry);

        // Under the write lock, so load/store cannot interleave with another insert
        let size = self.size.load(Ordering::SeqCst) + added - removed;
        self.size.store(size, Ordering::SeqCst);
        size
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> MemTableIterator {
        let entries: Vec<_> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MemTableIterator {
            inner: entries.into_iter(),
        }
    }

    /// Smallest key strictly greater than `after` (or the first key when `None`)
    pub fn first_key_after(&self, after: Option<&[u8]>) -> Option<Vec<u8>> {
        let data = self.data.read();
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        data.range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone())
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::SeqCst);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a MemTable snapshot
pub struct MemTableIterator {
    inner: std::vec::IntoIter<(Vec<u8>, MemTableEntry)>,
}

impl Iterator for MemTableIterator {
    type Item = (Vec<u8>, MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
