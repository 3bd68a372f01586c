//! Engine Module
//!
//! The embedded LSM storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Trigger flushes when MemTable is full
//! - Manage crash recovery on startup
//! - Serve ordered cursors over the merged view

mod cursor;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, SpaceKvError};
use crate::facade::KvEngine;
use crate::memtable::{MemTable, MemTableEntry};
use crate::storage::StorageManager;
use crate::wal::{Operation, WalRecovery, WalWriter};

pub use cursor::EngineIter;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/flush): serialized by the `wal` mutex
///   - Order: WAL → memtable → (maybe) flush to storage
///
/// - **Reads** (get, cursor steps): no writer lock
///   - MemTable uses internal RwLock (many concurrent readers)
///   - StorageManager serves lookups under its read lock
pub struct Engine {
    config: Config,

    /// Directory for SSTables
    storage_dir: PathBuf,

    /// Write-ahead log; holding this lock serializes writes
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    closed: AtomicBool,

    /// Cursors handed out and not yet released
    open_cursors: AtomicUsize,
}

impl Engine {
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Load existing SSTables
    /// 3. Replay the WAL if one exists and flush it to an SSTable
    /// 4. Start a fresh WAL
    pub fn open(config: Config) -> Result<Self> {
        if !config.data_dir.exists() && !config.create_if_missing {
            return Err(SpaceKvError::Config(format!(
                "data directory {} does not exist",
                config.data_dir.display()
            )));
        }
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_corrupted > 0 || recovery.was_truncated {
                warn!(
                    corrupted = recovery.entries_corrupted,
                    truncated = recovery.was_truncated,
                    "WAL damage detected during recovery"
                );
            }
            if recovery.entries_recovered > 0 {
                info!(
                    recovered = recovery.entries_recovered,
                    last_lsn = recovery.last_lsn,
                    "replaying WAL"
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Put { key, value } => {
                        memtable.put(key, value);
                    }
                    Operation::Delete { key } => {
                        memtable.delete(key);
                    }
                }
            }

            // Recovered data must be durable before the WAL is reset below
            if !memtable.is_empty() {
                storage.flush(&memtable)?;
                memtable.clear();
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        info!(
            data_dir = %config.data_dir.display(),
            sstables = storage.sstable_count(),
            "engine opened"
        );

        Ok(Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            closed: AtomicBool::new(false),
            open_cursors: AtomicUsize::new(0),
        })
    }

    /// Open with a path, using default config otherwise
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;

        if let Some(entry) = self.memtable.get(key) {
            return match entry {
                MemTableEntry::Value(value) => Ok(Some(value)),
                MemTableEntry::Tombstone => Ok(None),
            };
        }

        self.storage.get(key)
    }

    /// Put a key-value pair: WAL first, then memtable, then maybe flush
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let mut wal = self.wal.lock();

        wal.append(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        let new_size = self.memtable.put(key.to_vec(), value.to_vec());

        if new_size >= self.config.memtable_size_limit {
            self.flush_locked(&mut wal)?;
        }
        Ok(())
    }

    /// Delete a key by logging and buffering a tombstone
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let mut wal = self.wal.lock();

        wal.append(Operation::Delete { key: key.to_vec() })?;
        let new_size = self.memtable.delete(key.to_vec());

        if new_size >= self.config.memtable_size_limit {
            self.flush_locked(&mut wal)?;
        }
        Ok(())
    }

    /// Flush memtable to disk regardless of its size
    pub fn flush(&self) -> Result<()> {
        self.ensure_open()?;
        let mut wal = self.wal.lock();
        self.flush_locked(&mut wal)
    }

    /// Called with the WAL lock held
    fn flush_locked(&self, wal: &mut WalWriter) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        self.storage.flush(&self.memtable)?;
        self.memtable.clear();

        // Entries are now durable in an SSTable
        wal.truncate()
    }

    /// Close the engine: flush pending data and sync the WAL
    ///
    /// Every later call, including a second `close`, fails with `EngineClosed`.
    pub fn close(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(SpaceKvError::EngineClosed);
        }

        self.flush_locked(&mut wal)?;
        wal.sync()?;
        info!(data_dir = %self.config.data_dir.display(), "engine closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Ordered cursor over live keys
    pub fn iter(&self) -> Result<EngineIter<'_>> {
        self.ensure_open()?;
        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(EngineIter::new(self))
    }

    /// Smallest key (live or tombstoned) strictly after `after`
    pub(crate) fn next_key_after(&self, after: Option<&[u8]>) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        let buffered = self.memtable.first_key_after(after);
        let stored = self.storage.first_key_after(after);
        Ok(match (buffered, stored) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        })
    }

    pub(crate) fn release_cursor(&self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(SpaceKvError::EngineClosed);
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Cursors handed out and not yet closed or dropped
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl KvEngine for Engine {
    type Cursor<'a> = EngineIter<'a>;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Engine::get(self, key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Engine::put(self, key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        Engine::delete(self, key)
    }

    fn cursor(&self) -> Result<EngineIter<'_>> {
        self.iter()
    }

    fn close(&self) -> Result<()> {
        Engine::close(self)
    }

    fn is_closed(&self) -> bool {
        Engine::is_closed(self)
    }
}
