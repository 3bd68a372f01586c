//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs;
use std::path::Path;

use crate::error::{Result, SpaceKvError};

use super::{WalEntry, HEADER_SIZE};

/// What the reader found at its current position
pub(crate) enum Frame {
    Entry(WalEntry),
    /// A complete frame whose checksum or payload is bad
    Corrupt { lsn: u64 },
    /// Fewer bytes left than the frame claims (torn write at the tail)
    Partial,
    End,
}

/// Reads entries from the WAL file
pub struct WalReader {
    data: Vec<u8>,
    position: usize,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(Self { data, position: 0 })
    }

    /// Read the next entry from the WAL
    ///
    /// `Ok(None)` at a clean end of file; a torn or corrupt frame is an error.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame() {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Partial => Err(SpaceKvError::WalCorruption(format!(
                "partial entry at offset {}",
                self.position
            ))),
            Frame::Corrupt { lsn } => Err(SpaceKvError::WalCorruption(format!(
                "corrupt entry with lsn {}",
                lsn
            ))),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset of the next unread frame
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn next_frame(&mut self) -> Frame {
        let remaining = &self.data[self.position..];
        if remaining.is_empty() {
            return Frame::End;
        }

        let (lsn, _, len) = match WalEntry::parse_header(remaining) {
            Ok(header) => header,
            Err(_) => return Frame::Partial,
        };
        let frame_len = HEADER_SIZE + len;
        if remaining.len() < frame_len {
            return Frame::Partial;
        }

        let frame = &remaining[..frame_len];
        self.position += frame_len;

        match WalEntry::deserialize(frame) {
            Ok(entry) => Frame::Entry(entry),
            Err(_) => Frame::Corrupt { lsn },
        }
    }
}

/// Iterator over WAL entries
///
/// Stops after the first error.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
