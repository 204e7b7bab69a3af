//! WAL Entry definitions
//!
//! Defines the logical entry and its on-disk record framing.
//!
//! ## Record Layout (big-endian)
//! ```text
//! ┌─────────┬───────────┬───────────────┬─────────────┬───────────────┬─────┬───────┐
//! │ CRC (4) │ Flags (4) │ Timestamp (8) │ Key Len (4) │ Value Len (4) │ Key │ Value │
//! └─────────┴───────────┴───────────────┴─────────────┴───────────────┴─────┴───────┘
//!           └──────────────────── covered by CRC ─────────────────────────────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{KvError, Result};

/// Size of the stored checksum that prefixes every record
pub const CHECKSUM_SIZE: usize = 4;

/// Size of the fixed header: flags + timestamp + key_len + value_len
pub const HEADER_SIZE: usize = 20;

/// Bytes before the variable payload starts
pub const RECORD_PREFIX_SIZE: usize = CHECKSUM_SIZE + HEADER_SIZE;

/// Flag bit 0: the record is a tombstone
pub const FLAG_TOMBSTONE: u32 = 0x1;

/// Operations that can be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Insert or overwrite a key
    Set,

    /// Remove a key (tombstone)
    Delete,
}

impl Operation {
    /// Flag word written for this operation
    pub fn flags(self) -> u32 {
        match self {
            Operation::Set => 0,
            Operation::Delete => FLAG_TOMBSTONE,
        }
    }

    /// Decode the operation from a flag word; reserved bits are ignored
    pub fn from_flags(flags: u32) -> Self {
        if flags & FLAG_TOMBSTONE != 0 {
            Operation::Delete
        } else {
            Operation::Set
        }
    }
}

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// The operation to perform
    pub operation: Operation,

    /// Raw key bytes
    pub key: Vec<u8>,

    /// Raw value bytes (always empty for deletes)
    pub value: Vec<u8>,

    /// Nanoseconds since the Unix epoch when the mutation was made
    pub timestamp: u64,
}

impl WalEntry {
    /// Create a set entry
    pub fn set(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            operation: Operation::Set,
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }

    /// Create a delete entry
    pub fn delete(key: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            operation: Operation::Delete,
            key: key.into(),
            value: Vec::new(),
            timestamp,
        }
    }

    /// Total on-disk size of this entry's record
    pub fn encoded_len(&self) -> usize {
        RECORD_PREFIX_SIZE + self.key.len() + self.record_value().len()
    }

    /// Encode into a full on-disk record (checksum included)
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_record(self.operation, &self.key, &self.value, self.timestamp)
            .map(|buf| buf.to_vec())
    }

    /// CRC of header + payload, as stored in the record's first four bytes
    pub fn compute_crc(&self) -> Result<u32> {
        let record = encode_record(self.operation, &self.key, &self.value, self.timestamp)?;
        Ok(crc32fast::hash(&record[CHECKSUM_SIZE..]))
    }

    /// Decode exactly one record from `bytes`
    ///
    /// Uses the same error taxonomy as replay, with offsets relative to the
    /// start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CHECKSUM_SIZE {
            return Err(truncated(0, CHECKSUM_SIZE, bytes.len()));
        }
        let stored = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        let rest = &bytes[CHECKSUM_SIZE..];
        let header_bytes: &[u8; HEADER_SIZE] = rest
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| truncated(0, HEADER_SIZE, rest.len()))?;
        let header = RecordHeader::parse(header_bytes);

        let payload = &rest[HEADER_SIZE..];
        let payload_len = header.payload_len();
        if (payload.len() as u64) < payload_len {
            return Err(truncated(0, payload_len as usize, payload.len()));
        }
        if payload.len() as u64 > payload_len {
            return Err(KvError::MalformedRecord {
                offset: 0,
                reason: format!(
                    "{} trailing bytes after record",
                    payload.len() as u64 - payload_len
                ),
            });
        }

        decode_body(0, stored, header_bytes, payload.to_vec())
    }

    fn record_value(&self) -> &[u8] {
        match self.operation {
            Operation::Set => &self.value,
            Operation::Delete => &[],
        }
    }
}

/// Parsed fixed-width record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub flags: u32,
    pub timestamp: u64,
    pub key_len: u32,
    pub value_len: u32,
}

impl RecordHeader {
    /// Parse the 20 header bytes
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        Self {
            flags: buf.get_u32(),
            timestamp: buf.get_u64(),
            key_len: buf.get_u32(),
            value_len: buf.get_u32(),
        }
    }

    /// Combined length of key and value
    pub fn payload_len(&self) -> u64 {
        u64::from(self.key_len) + u64::from(self.value_len)
    }
}

// =============================================================================
// Shared encode/decode helpers (used by writer and reader)
// =============================================================================

/// Build a complete record; a delete always carries an empty value
pub(crate) fn encode_record(
    operation: Operation,
    key: &[u8],
    value: &[u8],
    timestamp: u64,
) -> Result<BytesMut> {
    let value = match operation {
        Operation::Set => value,
        Operation::Delete => &[],
    };
    let key_len = length_field(key.len())?;
    let value_len = length_field(value.len())?;

    let mut buf = BytesMut::with_capacity(RECORD_PREFIX_SIZE + key.len() + value.len());
    buf.put_u32(0); // checksum, filled in below
    buf.put_u32(operation.flags());
    buf.put_u64(timestamp);
    buf.put_u32(key_len);
    buf.put_u32(value_len);
    buf.put_slice(key);
    buf.put_slice(value);

    let crc = crc32fast::hash(&buf[CHECKSUM_SIZE..]);
    buf[..CHECKSUM_SIZE].copy_from_slice(&crc.to_be_bytes());
    Ok(buf)
}

/// Verify the checksum and split the payload into an entry
///
/// `payload` must be exactly `key_len + value_len` bytes long.
pub(crate) fn decode_body(
    offset: u64,
    stored: u32,
    header_bytes: &[u8; HEADER_SIZE],
    mut payload: Vec<u8>,
) -> Result<WalEntry> {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header_bytes);
    hasher.update(&payload);
    let computed = hasher.finalize();

    if stored != computed {
        return Err(KvError::ChecksumMismatch {
            offset,
            stored,
            computed,
        });
    }

    let header = RecordHeader::parse(header_bytes);
    let operation = Operation::from_flags(header.flags);
    if operation == Operation::Delete && header.value_len != 0 {
        return Err(KvError::MalformedRecord {
            offset,
            reason: format!("tombstone carries a {}-byte value", header.value_len),
        });
    }

    let value = payload.split_off(header.key_len as usize);
    Ok(WalEntry {
        operation,
        key: payload,
        value,
        timestamp: header.timestamp,
    })
}

pub(crate) fn truncated(offset: u64, expected: usize, actual: usize) -> KvError {
    KvError::TruncatedRecord {
        offset,
        expected,
        actual,
    }
}

fn length_field(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| KvError::RecordTooLarge {
        offset: 0,
        size: len as u64,
        limit: u64::from(u32::MAX),
    })
}
