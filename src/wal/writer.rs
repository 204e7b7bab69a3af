//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::config::{SyncMode, DEFAULT_MAX_RECORD_SIZE};
use crate::error::{KvError, Result};

use super::entry::encode_record;
use super::recovery::{RecoveryStats, WalRecovery};
use super::{Operation, WalEntry};

/// Writes records to the WAL file
///
/// The file is opened in append mode and never truncated or rewritten.
/// Every `append` is followed by a durable flush before it returns.
///
/// Once a write or flush fails the writer refuses all further appends: the
/// failed record may be partly on disk, and anything appended behind it
/// would be unreachable on replay.
pub struct WalWriter {
    /// Append-only file handle
    file: File,
    /// Location of the log, reused for replay
    path: PathBuf,
    /// Which flush call makes an append durable
    sync_mode: SyncMode,
    /// Largest accepted key + value length
    max_record_size: u32,
    /// Byte length of the log as far as this writer knows
    offset: u64,
    /// Records appended through this handle
    records_appended: u64,
    /// Set by the first failed write or flush
    failed: bool,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self> {
        let existed = path.exists();

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();

        if !existed {
            sync_parent_dir(path)?;
            debug!(path = %path.display(), "created WAL file");
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_mode,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            offset,
            records_appended: 0,
            failed: false,
        })
    }

    /// Override the per-record payload limit
    pub fn with_max_record_size(mut self, limit: u32) -> Self {
        self.max_record_size = limit;
        self
    }

    /// Append one mutation and flush it to stable storage
    ///
    /// For `Operation::Delete` the value is ignored and an empty value is
    /// written. On error the record may or may not be partially on disk, and
    /// every later call fails without writing.
    pub fn append(
        &mut self,
        operation: Operation,
        key: &[u8],
        value: &[u8],
        timestamp: u64,
    ) -> Result<()> {
        if self.failed {
            return Err(KvError::Io(io::Error::other(
                "WAL writer is unusable after a failed append",
            )));
        }

        let value_len = match operation {
            Operation::Set => value.len() as u64,
            Operation::Delete => 0,
        };
        let size = key.len() as u64 + value_len;
        if size > u64::from(self.max_record_size) {
            return Err(KvError::RecordTooLarge {
                offset: self.offset,
                size,
                limit: u64::from(self.max_record_size),
            });
        }

        let record = encode_record(operation, key, value, timestamp)?;

        if let Err(e) = self.write_durable(&record) {
            self.failed = true;
            error!(
                path = %self.path.display(),
                offset = self.offset,
                error = %e,
                "WAL append failed, refusing further appends"
            );
            return Err(e);
        }

        self.offset += record.len() as u64;
        self.records_appended += 1;

        debug!(
            ?operation,
            key_len = key.len(),
            value_len,
            offset = self.offset,
            "appended WAL record"
        );

        Ok(())
    }

    /// Append a prepared entry
    pub fn append_entry(&mut self, entry: &WalEntry) -> Result<()> {
        self.append(entry.operation, &entry.key, &entry.value, entry.timestamp)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        match self.sync_mode {
            SyncMode::Full => self.file.sync_all()?,
            SyncMode::Data => self.file.sync_data()?,
        }
        Ok(())
    }

    /// Read back every record in the log, in file order
    pub fn replay(&self) -> Result<(Vec<WalEntry>, RecoveryStats)> {
        WalRecovery::replay(&self.path, self.max_record_size)
    }

    /// Flush and release the file handle
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End of the last record this writer knows to be complete
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records appended through this handle
    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    /// The configured sync mode
    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// True once an append has failed; no further appends are accepted
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    fn write_durable(&mut self, record: &[u8]) -> Result<()> {
        self.file.write_all(record)?;
        self.sync()
    }
}

/// Persist the directory entry of a newly created log
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
