//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before any in-memory mutation
//! - Durable flush before an append reports success
//! - CRC32 checksums for corruption detection
//! - Replay of the whole log, in file order, on startup
//!
//! ## File Format
//! No file header, no version: the file is a plain sequence of records.
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Record 1                                                     │
//! │ ┌─────────┬──────────────────────────────┬─────┬───────────┐ │
//! │ │ CRC (4) │ Flags·Ts·KeyLen·ValLen (20)  │ Key │ Value     │ │
//! │ └─────────┴──────────────────────────────┴─────┴───────────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Record 2 ...                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian. The CRC (CRC-32/IEEE) covers the header,
//! key and value. Flag bit 0 marks a tombstone, whose value is empty.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{
    Operation, RecordHeader, WalEntry, CHECKSUM_SIZE, FLAG_TOMBSTONE, HEADER_SIZE,
    RECORD_PREFIX_SIZE,
};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryStats, WalRecovery};
pub use writer::WalWriter;
