//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpaceKvError};

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl WalEntry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Frame the entry: `[lsn][crc][len][payload]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = self.payload()?;
        let crc = Self::checksum(self.lsn, &payload);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Parse one framed entry from the start of `bytes`
    ///
    /// Fails on a short buffer or a checksum mismatch.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::parse_header(bytes)?;

        let end = HEADER_SIZE + len;
        if bytes.len() < end {
            return Err(SpaceKvError::WalCorruption(format!(
                "truncated payload: expected {} bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let payload = &bytes[HEADER_SIZE..end];
        if Self::checksum(lsn, payload) != crc {
            return Err(SpaceKvError::WalCorruption(format!(
                "CRC mismatch for lsn {}",
                lsn
            )));
        }

        let (operation, timestamp): (Operation, u64) = bincode::deserialize(payload)
            .map_err(|e| SpaceKvError::WalCorruption(format!("bad payload: {}", e)))?;

        Ok(Self {
            lsn,
            operation,
            timestamp,
        })
    }

    /// Read `(lsn, crc, payload_len)` from a frame header
    pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(SpaceKvError::WalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&bytes[0..8]);
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[8..12]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[12..16]);

        Ok((
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len) as usize,
        ))
    }

    /// Size of the framed entry in bytes
    pub fn serialized_size(&self) -> Result<usize> {
        Ok(HEADER_SIZE + self.payload()?.len())
    }

    /// CRC32 over the LSN and payload
    pub fn compute_crc(&self) -> Result<u32> {
        Ok(Self::checksum(self.lsn, &self.payload()?))
    }

    fn payload(&self) -> Result<Vec<u8>> {
        bincode::serialize(&(&self.operation, self.timestamp))
            .map_err(|e| SpaceKvError::WalCorruption(format!("cannot encode entry: {}", e)))
    }

    fn checksum(lsn: u64, payload: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(payload);
        hasher.finalize()
    }
}
