//! Store Module
//!
//! The state engine that couples the WAL with the in-memory map.
//!
//! ## Responsibilities
//! - Log every mutation durably before it becomes visible in memory
//! - Serve reads from memory only
//! - Rebuild memory state from the WAL on open

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::memtable::{MemTable, StoredValue};
use crate::wal::{Operation, RecoveryStats, WalWriter};

/// A durable key-value store
///
/// ## Concurrency Model
///
/// - **Writes** (set/delete): the WAL append and fsync run under the `wal`
///   mutex only. The memtable write lock is taken before that mutex is
///   released and the map is updated after, so memory sees mutations in
///   exactly the order they sit in the log. Readers never wait on an fsync.
/// - **Reads** (get/keys): shared memtable read lock, no disk I/O.
///
/// Lock order is always `wal` → memtable; readers only take the memtable.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Write-ahead log (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// Live key/value state (internal RwLock)
    memtable: MemTable,

    /// What the opening replay found
    recovery: RecoveryStats,
}

impl Store {
    /// Open or create a store whose WAL lives at `path`, with default config
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().wal_path(path.as_ref()).build();
        Self::open_with(config)
    }

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Open/create the WAL file
    /// 2. Replay it from offset zero
    /// 3. Apply each entry, in file order, to an empty memtable
    ///
    /// Any replay failure fails the open; there is no partial recovery.
    pub fn open_with(config: Config) -> Result<Self> {
        config.validate()?;

        if config.create_dirs {
            if let Some(parent) = config.wal_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let wal = WalWriter::open(&config.wal_path, config.sync_mode)?
            .with_max_record_size(config.max_record_size);

        let (entries, recovery) = wal.replay().map_err(|e| {
            error!(
                path = %config.wal_path.display(),
                error = %e,
                "WAL replay failed, refusing to open store"
            );
            e
        })?;

        let memtable = MemTable::new();
        {
            let mut table = memtable.write();
            for entry in entries {
                table.apply(entry);
            }
        }

        info!(
            path = %config.wal_path.display(),
            records = recovery.entries_recovered,
            sets = recovery.sets,
            deletes = recovery.deletes,
            bytes = recovery.bytes_read,
            live_keys = memtable.len(),
            sync_mode = ?wal.sync_mode(),
            "store opened"
        );

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            memtable,
            recovery,
        })
    }

    /// Set a key to a value
    ///
    /// The value is visible to readers only after the WAL record is durable.
    /// If the append fails the memtable is left untouched.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let timestamp = now_nanos();
        let stored = StoredValue::new(value.to_vec(), timestamp);

        let mut wal = self.wal.lock();
        wal.append(Operation::Set, key, value, timestamp)?;
        let mut table = self.memtable.write();
        drop(wal);

        table.put(key.to_vec(), stored);
        Ok(())
    }

    /// Delete a key
    ///
    /// A tombstone is logged even when the key is absent.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let timestamp = now_nanos();

        let mut wal = self.wal.lock();
        wal.append(Operation::Delete, key, &[], timestamp)?;
        let mut table = self.memtable.write();
        drop(wal);

        table.remove(key);
        Ok(())
    }

    /// Get the value of a key
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.memtable.get_value(key).ok_or(KvError::KeyNotFound)
    }

    /// Get the value of a key along with the timestamp it was written at
    pub fn get_entry(&self, key: &[u8]) -> Result<StoredValue> {
        self.memtable.get(key).ok_or(KvError::KeyNotFound)
    }

    /// Snapshot of all live keys
    pub fn keys(&self) -> HashSet<Vec<u8>> {
        self.memtable.keys()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.memtable.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Close the store: final sync, then release the WAL file handle
    pub fn close(self) -> Result<()> {
        let wal = self.wal.into_inner();
        let path = wal.path().to_path_buf();
        let appended = wal.records_appended();
        wal.close()?;

        info!(path = %path.display(), appended, "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the WAL file
    pub fn path(&self) -> &Path {
        &self.config.wal_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Statistics from the replay performed by `open`
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }
}

/// Wall-clock time in nanoseconds since the Unix epoch
fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
