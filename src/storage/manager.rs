//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Answer ordered "next key" queries for engine cursors

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, SpaceKvError};
use crate::memtable::{MemTable, MemTableEntry};

use super::{SSTable, SSTableBuilder, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock; lookups take the read lock since
///   readers seek through their own file mutex
/// - `next_sstable_id`: Atomic counter (lock-free)
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    /// Next ID for creating new SSTables
    next_sstable_id: AtomicU64,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// Existing SSTables are opened newest first (highest ID first).
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    sstable_ids.push(id);
                }
            }
        }
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let sstables = sstable_ids
            .iter()
            .map(|id| SSTableReader::open(&Self::sstable_path_with_dir(path, *id)))
            .collect::<Result<Vec<_>>>()?;

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);
        debug!(dir = %path.display(), sstables = sstables.len(), "storage opened");

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found with value
    /// - `Ok(None)` — key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }

            match reader.get(key) {
                Ok(found) => return Ok(found),
                Err(SpaceKvError::KeyNotFound) => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Smallest key greater than `after` across every SSTable, tombstones included
    pub fn first_key_after(&self, after: Option<&[u8]>) -> Option<Vec<u8>> {
        let sstables = self.sstables.read();
        sstables
            .iter()
            .filter_map(|reader| reader.first_key_after(after))
            .min()
            .map(|k| k.to_vec())
    }

    /// Flush a MemTable to a new SSTable
    ///
    /// Creates a new SSTable file from the MemTable's sorted entries,
    /// opens a reader for it, and adds it to the front of the list.
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(SpaceKvError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::new(&path)?;
        for (key, entry) in memtable.iter() {
            match entry {
                MemTableEntry::Value(v) => builder.add(&key, &v)?,
                MemTableEntry::Tombstone => builder.add_tombstone(&key)?,
            }
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, reader);

        debug!(id, entries = metadata.entry_count, "memtable flushed");
        Ok(metadata)
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        name.strip_prefix("sstable_")?.parse().ok()
    }
}
