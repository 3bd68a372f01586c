//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
///
/// Opening a writer starts a fresh log; the engine replays and flushes any
/// previous log before it opens one.
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN that the next append will receive
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Appends since the last fsync
    uncommitted: usize,
}

impl WalWriter {
    /// Open or create a WAL file, discarding previous contents
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: 1,
            sync_strategy,
            uncommitted: 0,
        })
    }

    /// Append an operation, returning the LSN it was logged under
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.current_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        self.writer.write_all(&bytes)?;
        self.current_lsn += 1;
        self.uncommitted += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Drop every logged entry (called once they are durable in an SSTable)
    pub fn truncate(&mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;

        self.current_lsn = 1;
        self.uncommitted = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Entries appended but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
