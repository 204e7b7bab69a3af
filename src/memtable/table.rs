//! MemTable implementation
//!
//! HashMap-based memtable with RwLock for concurrency.

use std::collections::{HashMap, HashSet};

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::wal::{Operation, WalEntry};

use super::StoredValue;

type Map = HashMap<Vec<u8>, StoredValue>;

/// In-memory table of live keys
pub struct MemTable {
    data: RwLock<Map>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Get a value and its timestamp (read lock)
    pub fn get(&self, key: &[u8]) -> Option<StoredValue> {
        self.data.read().get(key).cloned()
    }

    /// Get only the value bytes (read lock)
    pub fn get_value(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).map(|stored| stored.value.clone())
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Snapshot of all live keys, in no particular order
    pub fn keys(&self) -> HashSet<Vec<u8>> {
        self.data.read().keys().cloned().collect()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Take the write lock for one or more mutations
    ///
    /// This is the only way to mutate the table. The store uses it to take
    /// the lock before releasing the WAL, so mutations reach the map in log
    /// order.
    pub fn write(&self) -> MemTableWriter<'_> {
        MemTableWriter {
            guard: self.data.write(),
        }
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to the MemTable for the lifetime of the guard
pub struct MemTableWriter<'a> {
    guard: RwLockWriteGuard<'a, Map>,
}

impl MemTableWriter<'_> {
    pub fn put(&mut self, key: Vec<u8>, value: StoredValue) -> Option<StoredValue> {
        self.guard.insert(key, value)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<StoredValue> {
        self.guard.remove(key)
    }

    /// Apply a replayed WAL entry: sets upsert, deletes remove if present
    pub fn apply(&mut self, entry: WalEntry) {
        match entry.operation {
            Operation::Set => {
                self.guard
                    .insert(entry.key, StoredValue::new(entry.value, entry.timestamp));
            }
            Operation::Delete => {
                self.guard.remove(&entry.key);
            }
        }
    }
}
