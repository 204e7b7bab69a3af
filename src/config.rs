//! Configuration for logkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Default upper bound on `key_len + value_len` of a single record (64 MiB)
pub const DEFAULT_MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// Main configuration for a logkv store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Path of the write-ahead log file
    pub wal_path: PathBuf,

    /// How each append is made durable
    pub sync_mode: SyncMode,

    /// Largest accepted `key_len + value_len`, enforced on append and replay
    pub max_record_size: u32,

    /// Create missing parent directories of `wal_path` on open
    pub create_dirs: bool,
}

/// Durable flush performed after every append
///
/// Both modes complete before `append` returns; they differ only in whether
/// file metadata (mtime etc.) is flushed along with the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// `fsync`: data and all metadata
    #[default]
    Full,

    /// `fdatasync`: data plus the metadata needed to read it back
    Data,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from("./logkv.wal"),
            sync_mode: SyncMode::Full,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            create_dirs: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_record_size == 0 {
            return Err(KvError::Config(
                "max_record_size must be greater than zero".to_string(),
            ));
        }
        if self.wal_path.as_os_str().is_empty() {
            return Err(KvError::Config("wal_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the WAL file path
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the sync mode
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    /// Set the maximum record payload size (in bytes)
    pub fn max_record_size(mut self, size: u32) -> Self {
        self.config.max_record_size = size;
        self
    }

    /// Whether to create missing parent directories
    pub fn create_dirs(mut self, create: bool) -> Self {
        self.config.create_dirs = create;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
