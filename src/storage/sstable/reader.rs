//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, SpaceKvError};

use super::{read_u32, read_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
///
/// The file handle sits behind a mutex so lookups take `&self` and the
/// storage manager can serve reads under its read lock.
pub struct SSTableReader {
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// key → file offset of the entry
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
}

impl SSTableReader {
    /// Open an SSTable, verify the data checksum and load the index
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(SpaceKvError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(SpaceKvError::Storage(format!(
                "Invalid SSTable magic: expected SPKV, got {:?}",
                &header[0..4]
            )));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(SpaceKvError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }
        let entry_count = read_u64(&header, 6);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;
        let index_offset = read_u64(&footer, 0);
        let data_crc = read_u32(&footer, 8);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(SpaceKvError::Storage(format!(
                "SSTable {} has bad index offset {}",
                path.display(),
                index_offset
            )));
        }

        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut data = vec![0u8; (index_offset - HEADER_SIZE) as usize];
        file.read_exact(&mut data)?;
        if crc32fast::hash(&data) != data_crc {
            return Err(SpaceKvError::Storage(format!(
                "SSTable {} data checksum mismatch",
                path.display()
            )));
        }

        let mut index_data = vec![0u8; (file_size - FOOTER_SIZE - index_offset) as usize];
        file.read_exact(&mut index_data)?;
        let index = Self::parse_index(&index_data)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
        })
    }

    /// Parse `[key_len(4)][offset(8)][key]` records
    fn parse_index(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, u64>> {
        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < bytes.len() {
            if pos + 12 > bytes.len() {
                return Err(SpaceKvError::Storage("truncated SSTable index".to_string()));
            }
            let key_len = read_u32(bytes, pos) as usize;
            let offset = read_u64(bytes, pos + 4);
            pos += 12;

            if pos + key_len > bytes.len() {
                return Err(SpaceKvError::Storage("truncated SSTable index key".to_string()));
            }
            index.insert(bytes[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }
        Ok(index)
    }

    /// Get a value by key — O(log n) lookup via in-memory index
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found with value
    /// - `Ok(None)` — key found but is a tombstone (deleted)
    /// - `Err(KeyNotFound)` — key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Err(SpaceKvError::KeyNotFound),
        };

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let key_len = read_u32(&header, 0) as i64;
        let val_len = read_u32(&header, 4);

        if val_len == TOMBSTONE_MARKER {
            return Ok(None);
        }

        file.seek_relative(key_len)?;
        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;
        Ok(Some(value))
    }

    /// Smallest key in this table strictly greater than `after`
    pub fn first_key_after(&self, after: Option<&[u8]>) -> Option<&[u8]> {
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        self.index
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, _)| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.index.keys().next(), self.index.keys().next_back()) {
            (Some(min), Some(max)) => key >= min.as_slice() && key <= max.as_slice(),
            _ => false,
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
