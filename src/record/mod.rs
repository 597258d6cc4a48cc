//! Log Record Model
//!
//! Defines the unit of logging: a [`LogRecord`] is one [`LogKey`] plus an
//! ordered list of [`EditCell`]s, appended and read back as a single atomic
//! unit. Also defines the reserved sentinel bytes used by the cache-flush
//! marker protocol; writer, reader, and splitter must agree on these
//! bit-for-bit, so they live here and nowhere else.

mod codec;

pub use codec::{encode_record, read_record, HEADER_SIZE, MAX_RECORD_SIZE};

use serde::{Deserialize, Serialize};

// =============================================================================
// Flush-Marker Sentinels
// =============================================================================

/// Reserved row identifier for cache-flush marker records
pub const META_ROW: &[u8] = b"__META_ROW__";

/// Reserved column family identifier for cache-flush marker records
pub const META_FAMILY: &[u8] = b"__META_FAMILY__";

/// Reserved value marking a completed cache flush
pub const FLUSH_COMPLETE: &[u8] = b"FLUSH-COMPLETE";

// =============================================================================
// Record Types
// =============================================================================

/// Identifies one record's origin and position in the log stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogKey {
    /// Region that owns this record (non-empty)
    pub region_id: Vec<u8>,

    /// Table the region belongs to
    pub table_id: Vec<u8>,

    /// Position in the global log stream - strictly increasing per writer,
    /// across all regions and across file rolls
    pub sequence_number: u64,

    /// Caller-supplied write time (unix millis)
    pub write_time: u64,
}

impl LogKey {
    pub fn new(
        region_id: impl Into<Vec<u8>>,
        table_id: impl Into<Vec<u8>>,
        sequence_number: u64,
        write_time: u64,
    ) -> Self {
        Self {
            region_id: region_id.into(),
            table_id: table_id.into(),
            sequence_number,
            write_time,
        }
    }
}

/// One column mutation
///
/// `value` may be empty or span multiple underlying storage blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditCell {
    pub row: Vec<u8>,
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub timestamp: u64,
    pub value: Vec<u8>,
}

impl EditCell {
    pub fn new(
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: u64,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            value: value.into(),
        }
    }
}

/// One WAL entry: a key plus one-or-more edits, atomic on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub key: LogKey,
    pub edits: Vec<EditCell>,
}

impl LogRecord {
    pub fn new(key: LogKey, edits: Vec<EditCell>) -> Self {
        Self { key, edits }
    }

    /// Build the complete-cache-flush marker record for a region
    ///
    /// Replay consumers recognize it by the reserved row/family/value bytes.
    pub fn flush_marker(
        region_id: impl Into<Vec<u8>>,
        table_id: impl Into<Vec<u8>>,
        sequence_number: u64,
        write_time: u64,
    ) -> Self {
        Self {
            key: LogKey::new(region_id, table_id, sequence_number, write_time),
            edits: vec![EditCell::new(
                META_ROW,
                META_FAMILY,
                Vec::new(),
                write_time,
                FLUSH_COMPLETE,
            )],
        }
    }

    /// True if this record is a complete-cache-flush marker
    pub fn is_flush_marker(&self) -> bool {
        self.edits.len() == 1
            && self.edits[0].row == META_ROW
            && self.edits[0].family == META_FAMILY
            && self.edits[0].value == FLUSH_COMPLETE
    }
}
