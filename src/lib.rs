//! # logkv
//!
//! An embedded, crash-safe key-value store with:
//! - Write-Ahead Logging (WAL) with a durable flush on every mutation
//! - CRC32-checked binary records
//! - Full state reconstruction by replaying the log on open
//! - Shared reads / exclusive writes over a single in-memory map
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │              set / get / delete / keys / close              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                          Store                              │
//! │          (log first, then apply to memory)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │
//!          └──── replay on open ────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use logkv::Store;
//!
//! # fn main() -> logkv::Result<()> {
//! let store = Store::open("data/app.wal")?;
//! store.set(b"name", b"gopher")?;
//! assert_eq!(store.get(b"name")?, b"gopher".to_vec());
//! store.delete(b"name")?;
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod memtable;
pub mod store;
pub mod wal;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{Config, SyncMode};
pub use error::{KvError, Result};
pub use memtable::StoredValue;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
