//! Record framing codec
//!
//! Serializes one [`LogRecord`] into a self-delimiting frame:
//!
//! ```text
//! ┌─────────┬─────────┬──────────────────────────┐
//! │ CRC (4) │ Len (4) │  bincode(LogRecord)      │
//! └─────────┴─────────┴──────────────────────────┘
//! ```
//!
//! Header integers are big-endian. The CRC32 covers the body bytes only.
//! A frame cut short at end-of-file is a truncated tail (the writer may
//! still be appending, or died mid-record) and reads as end-of-stream; a
//! CRC mismatch or undecodable body is corruption.

use std::io::{Read, Seek, SeekFrom};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{LogError, Result};
use super::LogRecord;

/// Frame header size: 4 bytes CRC + 4 bytes body length
pub const HEADER_SIZE: usize = 8;

/// Maximum body size (64 MB) - a larger length field means the header
/// bytes are garbage, not a real record
pub const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// Encode a record into a framed byte buffer
pub fn encode_record(record: &LogRecord) -> Result<Bytes> {
    let body =
        bincode::serialize(record).map_err(|e| LogError::Serialization(e.to_string()))?;

    if body.len() > MAX_RECORD_SIZE as usize {
        return Err(LogError::Serialization(format!(
            "record body of {} bytes exceeds maximum {}",
            body.len(),
            MAX_RECORD_SIZE
        )));
    }

    let crc = crc32fast::hash(&body);

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + body.len());
    buf.put_u32(crc);
    buf.put_u32(body.len() as u32);
    buf.put_slice(&body);

    Ok(buf.freeze())
}

/// Read up to `buf.len()` bytes, returning how many landed before EOF
fn fill_buf<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Decode the next record from a stream
///
/// Returns:
/// - `Ok(Some(record))` - one complete, checksum-verified record
/// - `Ok(None)` - no complete record available at call time (clean EOF,
///   or a truncated tail that a future sync may complete)
/// - `Err(Corruption)` - bytes are present but wrong: bad length field,
///   CRC mismatch, or undecodable body
///
/// On a truncated tail the stream position is rewound to the record
/// boundary, so a caller can poll again once the writer has synced more
/// bytes and pick up the record that was mid-flight.
pub fn read_record<R: Read + Seek>(reader: &mut R) -> Result<Option<LogRecord>> {
    let mut header = [0u8; HEADER_SIZE];
    let got = fill_buf(reader, &mut header)?;
    if got < HEADER_SIZE {
        reader.seek(SeekFrom::Current(-(got as i64)))?;
        return Ok(None);
    }

    let crc = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

    if len > MAX_RECORD_SIZE {
        return Err(LogError::Corruption(format!(
            "record length {} exceeds maximum {}",
            len, MAX_RECORD_SIZE
        )));
    }

    let mut body = vec![0u8; len as usize];
    let got = fill_buf(reader, &mut body)?;
    if got < len as usize {
        reader.seek(SeekFrom::Current(-((HEADER_SIZE + got) as i64)))?;
        return Ok(None);
    }

    let actual_crc = crc32fast::hash(&body);
    if actual_crc != crc {
        return Err(LogError::Corruption(format!(
            "CRC mismatch: stored {:#010x}, computed {:#010x}",
            crc, actual_crc
        )));
    }

    let record: LogRecord =
        bincode::deserialize(&body).map_err(|e| LogError::Corruption(e.to_string()))?;

    Ok(Some(record))
}
