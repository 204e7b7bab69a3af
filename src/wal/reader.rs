//! WAL Reader
//!
//! Streams records out of a WAL file, verifying each one.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::iter::FusedIterator;
use std::path::Path;

use tracing::trace;

use crate::config::DEFAULT_MAX_RECORD_SIZE;
use crate::error::{KvError, Result};

use super::entry::{decode_body, truncated, RecordHeader};
use super::{WalEntry, CHECKSUM_SIZE, HEADER_SIZE, RECORD_PREFIX_SIZE};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset of the next record to read
    offset: u64,
    max_record_size: u32,
}

impl WalReader {
    /// Open a WAL file for reading, positioned at offset zero
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        })
    }

    /// Override the per-record payload limit
    pub fn with_max_record_size(mut self, limit: u32) -> Self {
        self.max_record_size = limit;
        self
    }

    /// Offset of the next unread record (bytes consumed so far)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` only at a clean record boundary at end of file.
    /// A record that stops part way is `TruncatedRecord`; one whose bytes
    /// do not hash to the stored checksum is `ChecksumMismatch`.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let start = self.offset;

        let mut checksum = [0u8; CHECKSUM_SIZE];
        let n = read_full(&mut self.reader, &mut checksum)?;
        if n == 0 {
            return Ok(None);
        }
        if n < CHECKSUM_SIZE {
            return Err(truncated(start, CHECKSUM_SIZE, n));
        }
        let stored = u32::from_be_bytes(checksum);

        let mut header_bytes = [0u8; HEADER_SIZE];
        let n = read_full(&mut self.reader, &mut header_bytes)?;
        if n < HEADER_SIZE {
            return Err(truncated(start, HEADER_SIZE, n));
        }
        let header = RecordHeader::parse(&header_bytes);

        let payload_len = header.payload_len();
        if payload_len > u64::from(self.max_record_size) {
            return Err(KvError::RecordTooLarge {
                offset: start,
                size: payload_len,
                limit: u64::from(self.max_record_size),
            });
        }

        let mut payload = vec![0u8; payload_len as usize];
        let n = read_full(&mut self.reader, &mut payload)?;
        if n < payload.len() {
            return Err(truncated(start, payload.len(), n));
        }

        let entry = decode_body(start, stored, &header_bytes, payload)?;
        self.offset = start + RECORD_PREFIX_SIZE as u64 + payload_len;

        trace!(offset = start, operation = ?entry.operation, "read WAL record");
        Ok(Some(entry))
    }

    /// Iterate over entries until end of file or the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Yields at most one error, after which it is exhausted.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl WalIterator {
    /// Offset of the next unread record
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for WalIterator {}

/// Fill `buf` as far as the file allows, returning the number of bytes read
///
/// Unlike `read_exact`, a short count at end of file is reported rather than
/// turned into an error, so callers can tell a clean EOF from a torn record.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
