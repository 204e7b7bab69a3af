//! MemTable Module
//!
//! In-memory map holding the live state of the store.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Shared reads, exclusive writes (single RwLock)
//! - Apply replayed WAL entries during recovery
//!
//! Deleted keys are removed outright; tombstones only exist in the log.

mod table;

pub use table::{MemTable, MemTableWriter};

/// Value stored in the MemTable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// The raw value bytes
    pub value: Vec<u8>,

    /// Timestamp of the mutation that wrote it (ns since the Unix epoch)
    pub timestamp: u64,
}

impl StoredValue {
    pub fn new(value: Vec<u8>, timestamp: u64) -> Self {
        Self { value, timestamp }
    }
}
