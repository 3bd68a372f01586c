//! Tests for the Write-Ahead Log
//!
//! These tests verify:
//! - Entry framing and checksum detection
//! - Writer LSN assignment, sync strategies and truncation
//! - Reader iteration and error reporting
//! - Recovery from clean, torn and corrupted logs

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use spacekv::config::WalSyncStrategy;
use spacekv::wal::{Operation, WalEntry, WalReader, WalRecovery, WalWriter, HEADER_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn put_op(i: usize) -> Operation {
    Operation::Put {
        key: format!("key{}", i).into_bytes(),
        value: format!("value{}", i).into_bytes(),
    }
}

/// Write entries using WalWriter (produces a well-formed WAL)
fn write_entries_via_writer(path: &Path, count: usize) {
    let mut writer = WalWriter::open(path, WalSyncStrategy::EveryWrite).unwrap();
    for i in 0..count {
        writer.append(put_op(i)).unwrap();
    }
}

/// Write raw serialized entries directly to a file (for crafting corruption)
fn write_raw_entries(path: &Path, entries: &[WalEntry]) {
    let mut file = File::create(path).unwrap();
    for entry in entries {
        file.write_all(&entry.serialize().unwrap()).unwrap();
    }
    file.sync_all().unwrap();
}

// =============================================================================
// Entry Tests
// =============================================================================

#[test]
fn test_entry_serialize_deserialize() {
    let entry = WalEntry::new(7, Operation::Delete { key: b"users:1".to_vec() });
    let bytes = entry.serialize().unwrap();

    assert_eq!(bytes.len(), entry.serialized_size().unwrap());
    assert_eq!(&bytes[0..8], &7u64.to_le_bytes());

    let decoded = WalEntry::deserialize(&bytes).unwrap();
    assert_eq!(decoded, entry);
}

#[test]
fn test_entry_crc_covers_payload() {
    let entry = WalEntry::new(1, put_op(1));
    let mut bytes = entry.serialize().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(WalEntry::deserialize(&bytes).is_err());
}

#[test]
fn test_entry_crc_covers_lsn() {
    let entry = WalEntry::new(1, put_op(1));
    let mut bytes = entry.serialize().unwrap();
    bytes[0] = 2;

    assert!(WalEntry::deserialize(&bytes).is_err());
}

#[test]
fn test_entry_stored_crc_matches_compute() {
    let entry = WalEntry::new(3, put_op(3));
    let bytes = entry.serialize().unwrap();
    let stored = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);

    assert_eq!(stored, entry.compute_crc().unwrap());
}

#[test]
fn test_entry_short_buffers_rejected() {
    let bytes = WalEntry::new(1, put_op(1)).serialize().unwrap();

    assert!(WalEntry::deserialize(&bytes[..HEADER_SIZE - 1]).is_err());
    assert!(WalEntry::deserialize(&bytes[..bytes.len() - 1]).is_err());
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_assigns_sequential_lsns() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(writer.append(put_op(0)).unwrap(), 1);
    assert_eq!(writer.append(put_op(1)).unwrap(), 2);
    assert_eq!(writer.current_lsn(), 3);
    assert_eq!(writer.path(), wal_path.as_path());
}

#[test]
fn test_writer_every_n_entries_syncs_in_batches() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(put_op(0)).unwrap();
    writer.append(put_op(1)).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);

    writer.append(put_op(2)).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_writer_every_write_never_leaves_uncommitted() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(put_op(0)).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_writer_truncate_empties_file_and_resets_lsn() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(put_op(0)).unwrap();
    writer.append(put_op(1)).unwrap();

    writer.truncate().unwrap();
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
    assert_eq!(writer.current_lsn(), 1);

    writer.append(put_op(9)).unwrap();
    writer.sync().unwrap();

    let entries: Vec<_> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .collect::<spacekv::Result<_>>()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lsn, 1);
    assert_eq!(entries[0].operation, put_op(9));
}

#[test]
fn test_writer_open_discards_previous_log() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 5);

    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.current_lsn(), 1);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_reads_entries_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 10);

    let mut reader = WalReader::open(&wal_path).unwrap();
    for i in 0..10 {
        let entry = reader.next_entry().unwrap().unwrap();
        assert_eq!(entry.lsn, i as u64 + 1);
        assert_eq!(entry.operation, put_op(i));
    }
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position() as u64, fs::metadata(&wal_path).unwrap().len());
}

#[test]
fn test_reader_reports_torn_tail() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);
    OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .unwrap()
        .write_all(&[1, 2, 3])
        .unwrap();

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(results[2].is_err());
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert!(entries.is_empty());
    assert_eq!(result.entries_recovered, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_wal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 5);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(result.entries_recovered, 5);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 5);
}

#[test]
fn test_recover_truncates_partial_tail() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3);
    let clean_len = fs::metadata(&wal_path).unwrap().len();

    let torn = WalEntry::new(4, put_op(4)).serialize().unwrap();
    OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .unwrap()
        .write_all(&torn[..torn.len() / 2])
        .unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), clean_len);
}

#[test]
fn test_recover_skips_corrupted_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let entries: Vec<_> = (1..=3).map(|i| WalEntry::new(i, put_op(i as usize))).collect();
    write_raw_entries(&wal_path, &entries);

    // Flip a payload byte of the middle entry
    let mut bytes = fs::read(&wal_path).unwrap();
    let first_len = entries[0].serialized_size().unwrap();
    bytes[first_len + HEADER_SIZE] ^= 0xFF;
    fs::write(&wal_path, &bytes).unwrap();

    let (recovered, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.entries_recovered, 2);
    assert_eq!(
        recovered.iter().map(|e| e.lsn).collect::<Vec<_>>(),
        vec![1, 3]
    );
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);
    OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .unwrap()
        .write_all(&[0xAB; 5])
        .unwrap();
    let len_before = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();
    assert_eq!(result.entries_recovered, 2);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}
