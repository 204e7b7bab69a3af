//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Replay of a clean WAL (no corruption)
//! - Replay of an empty WAL
//! - Torn tails and corrupted records abort replay instead of being skipped
//! - Verify mode (stats only, no entries returned)
//! - Replay never modifies the file

use std::fs::{self, File};
use std::path::PathBuf;

use logkv::config::{SyncMode, DEFAULT_MAX_RECORD_SIZE};
use logkv::wal::{
    Operation, RecoveryStats, WalEntry, WalRecovery, WalWriter, RECORD_PREFIX_SIZE,
};
use logkv::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

/// Write entries using WalWriter (produces a well-formed WAL)
fn write_entries_via_writer(path: &PathBuf, count: usize) {
    let mut writer = WalWriter::open(path, SyncMode::Full).unwrap();
    for i in 0..count {
        writer
            .append(
                Operation::Set,
                format!("key{}", i).as_bytes(),
                format!("value{}", i).as_bytes(),
                i as u64 + 1,
            )
            .unwrap();
    }
}

fn replay(path: &PathBuf) -> logkv::Result<(Vec<WalEntry>, RecoveryStats)> {
    WalRecovery::replay(path, DEFAULT_MAX_RECORD_SIZE)
}

// =============================================================================
// Replay: Clean WAL Tests
// =============================================================================

#[test]
fn test_replay_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    File::create(&wal_path).unwrap();

    let (entries, stats) = replay(&wal_path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(stats, RecoveryStats::default());
}

#[test]
fn test_replay_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 1);

    let (entries, stats) = replay(&wal_path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(stats.entries_recovered, 1);
    assert_eq!(stats.sets, 1);
    assert_eq!(stats.deletes, 0);
    assert_eq!(stats.last_timestamp, Some(1));
    assert_eq!(stats.bytes_read, fs::metadata(&wal_path).unwrap().len());
}

#[test]
fn test_replay_multiple_entries_in_order() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 10);

    let (entries, stats) = replay(&wal_path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(stats.entries_recovered, 10);
    assert_eq!(stats.last_timestamp, Some(10));

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.key, format!("key{}", i).into_bytes());
        assert_eq!(entry.timestamp, i as u64 + 1);
    }
}

#[test]
fn test_replay_preserves_operations() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, SyncMode::Full).unwrap();
        writer.append(Operation::Set, b"k1", b"v1", 1).unwrap();
        writer.append(Operation::Delete, b"k1", b"", 2).unwrap();
        writer.append(Operation::Set, b"k2", b"v2", 3).unwrap();
    }

    let (entries, stats) = replay(&wal_path).unwrap();

    assert_eq!(
        entries,
        vec![
            WalEntry::set(b"k1".to_vec(), b"v1".to_vec(), 1),
            WalEntry::delete(b"k1".to_vec(), 2),
            WalEntry::set(b"k2".to_vec(), b"v2".to_vec(), 3),
        ]
    );
    assert_eq!(stats.sets, 2);
    assert_eq!(stats.deletes, 1);
}

// =============================================================================
// Replay: Torn Tail Tests
// =============================================================================

#[test]
fn test_replay_partial_header_at_tail_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 1);

    let mut bytes = fs::read(&wal_path).unwrap();
    let good_len = bytes.len() as u64;
    bytes.extend_from_slice(&[0u8; 8]);
    fs::write(&wal_path, &bytes).unwrap();

    let err = replay(&wal_path).unwrap_err();

    assert!(matches!(err, KvError::TruncatedRecord { .. }));
    assert_eq!(err.offset(), Some(good_len));
}

#[test]
fn test_replay_partial_data_at_tail_fails() {
    let (_temp, wal_path) = setup_temp_wal();

    let good = WalEntry::set(b"k".to_vec(), b"v".to_vec(), 1).encode().unwrap();
    let torn = WalEntry::set(b"k2".to_vec(), b"v2".to_vec(), 2).encode().unwrap();

    let mut bytes = good.clone();
    bytes.extend_from_slice(&torn[..torn.len() - 1]);
    fs::write(&wal_path, &bytes).unwrap();

    let err = replay(&wal_path).unwrap_err();
    assert!(matches!(err, KvError::TruncatedRecord { .. }));
    assert_eq!(err.offset(), Some(good.len() as u64));
}

#[test]
fn test_every_truncation_of_last_record_detected() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 3);

    let full = fs::read(&wal_path).unwrap();
    let last_len = WalEntry::set(b"key2".to_vec(), b"value2".to_vec(), 3).encoded_len();

    for n in 1..last_len {
        fs::write(&wal_path, &full[..full.len() - n]).unwrap();

        let err = replay(&wal_path).unwrap_err();
        assert!(
            matches!(err, KvError::TruncatedRecord { .. }),
            "cutting {} bytes gave {:?}",
            n,
            err
        );
    }
}

// =============================================================================
// Replay: Corruption Tests
// =============================================================================

#[test]
fn test_replay_corrupted_entry_fails() {
    let (_temp, wal_path) = setup_temp_wal();

    let entry1 = WalEntry::set(b"k1".to_vec(), b"v1".to_vec(), 1);
    let entry2 = WalEntry::set(b"k2".to_vec(), b"v2".to_vec(), 2);

    let mut bytes = entry1.encode().unwrap();
    let mut bad_bytes = entry2.encode().unwrap();
    if let Some(byte) = bad_bytes.last_mut() {
        *byte ^= 0xFF;
    }
    bytes.extend(bad_bytes);
    fs::write(&wal_path, &bytes).unwrap();

    // No partial list: the good first entry is not returned either
    let err = replay(&wal_path).unwrap_err();
    assert!(matches!(err, KvError::ChecksumMismatch { .. }));
    assert!(err.is_corruption());
}

#[test]
fn test_replay_mid_file_corruption_fails() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 5);

    let mut bytes = fs::read(&wal_path).unwrap();
    // Flip a key byte inside the first record
    bytes[RECORD_PREFIX_SIZE] ^= 0x20;
    fs::write(&wal_path, &bytes).unwrap();

    let err = replay(&wal_path).unwrap_err();
    assert!(matches!(err, KvError::ChecksumMismatch { offset: 0, .. }));
}

#[test]
fn test_replay_does_not_modify_file() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);

    let mut bytes = fs::read(&wal_path).unwrap();
    bytes.extend_from_slice(&[1, 2, 3]);
    fs::write(&wal_path, &bytes).unwrap();

    assert!(replay(&wal_path).is_err());
    assert_eq!(fs::read(&wal_path).unwrap(), bytes);
}

// =============================================================================
// Verify Tests
// =============================================================================

#[test]
fn test_verify_clean_wal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 5);

    let stats = WalRecovery::verify(&wal_path, DEFAULT_MAX_RECORD_SIZE).unwrap();
    let (_, replay_stats) = replay(&wal_path).unwrap();

    assert_eq!(stats, replay_stats);
    assert_eq!(stats.entries_recovered, 5);
}

#[test]
fn test_verify_corrupted_wal() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 2);

    let mut bytes = fs::read(&wal_path).unwrap();
    bytes[10] ^= 0xFF; // timestamp byte of the first record
    fs::write(&wal_path, &bytes).unwrap();

    let err = WalRecovery::verify(&wal_path, DEFAULT_MAX_RECORD_SIZE).unwrap_err();
    assert!(matches!(err, KvError::ChecksumMismatch { offset: 0, .. }));
}

#[test]
fn test_verify_respects_record_limit() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries_via_writer(&wal_path, 1); // "key0" + "value0" = 10 bytes

    assert!(WalRecovery::verify(&wal_path, 10).is_ok());

    let err = WalRecovery::verify(&wal_path, 9).unwrap_err();
    assert!(matches!(err, KvError::RecordTooLarge { size: 10, limit: 9, .. }));
}
