//! Error types for logkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for logkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Corruption Errors
    // -------------------------------------------------------------------------
    /// A record ended before all of its bytes were on disk (torn write)
    #[error(
        "WAL truncated record at offset {offset}: expected {expected} bytes, got {actual}"
    )]
    TruncatedRecord {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A fully-read record failed its integrity check
    #[error(
        "WAL checksum mismatch at offset {offset}: stored {stored:#010x}, computed {computed:#010x}"
    )]
    ChecksumMismatch {
        offset: u64,
        stored: u32,
        computed: u32,
    },

    /// Record payload exceeds the configured limit
    #[error("WAL record at offset {offset} too large: {size} bytes (limit {limit})")]
    RecordTooLarge { offset: u64, size: u64, limit: u64 },

    /// Checksum-valid record that violates the record format
    #[error("WAL malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    /// True when the error means the log cannot be trusted from some offset on
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            KvError::TruncatedRecord { .. }
                | KvError::ChecksumMismatch { .. }
                | KvError::RecordTooLarge { .. }
                | KvError::MalformedRecord { .. }
        )
    }

    /// Byte offset of the offending record, for corruption errors
    pub fn offset(&self) -> Option<u64> {
        match self {
            KvError::TruncatedRecord { offset, .. }
            | KvError::ChecksumMismatch { offset, .. }
            | KvError::RecordTooLarge { offset, .. }
            | KvError::MalformedRecord { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
