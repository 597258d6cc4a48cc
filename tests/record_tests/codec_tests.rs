//! Tests for record framing and serialization
//!
//! These tests verify:
//! - Round-trip encoding for single- and multi-edit records
//! - CRC32 corruption detection
//! - Truncated-tail handling (end-of-stream, not an error)
//! - Edge cases (empty values, block-sized values, garbage headers)

use std::io::Cursor;

use regionlog::record::{
    encode_record, read_record, EditCell, LogKey, LogRecord, HEADER_SIZE, MAX_RECORD_SIZE,
};
use regionlog::{FLUSH_COMPLETE, META_FAMILY, META_ROW};

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_record(sequence: u64, edit_count: usize) -> LogRecord {
    let edits = (0..edit_count)
        .map(|i| {
            EditCell::new(
                b"row".to_vec(),
                b"family".to_vec(),
                format!("col{}", i),
                1_700_000_000_000 + i as u64,
                format!("value{}", i),
            )
        })
        .collect();
    LogRecord::new(
        LogKey::new(b"region-1".to_vec(), b"table-1".to_vec(), sequence, 1_700_000_000_000),
        edits,
    )
}

// =============================================================================
// Round-Trip Tests
// =============================================================================

#[test]
fn test_encode_decode_single_edit() {
    let record = sample_record(1, 1);
    let frame = encode_record(&record).unwrap();

    let mut cursor = Cursor::new(frame.as_ref());
    let decoded = read_record(&mut cursor).unwrap().unwrap();

    assert_eq!(record, decoded);
}

#[test]
fn test_encode_decode_multi_edit() {
    let record = sample_record(42, 10);
    let frame = encode_record(&record).unwrap();

    let mut cursor = Cursor::new(frame.as_ref());
    let decoded = read_record(&mut cursor).unwrap().unwrap();

    assert_eq!(decoded.edits.len(), 10);
    assert_eq!(record, decoded);
}

#[test]
fn test_encode_decode_empty_value() {
    let record = LogRecord::new(
        LogKey::new(b"r".to_vec(), b"t".to_vec(), 7, 0),
        vec![EditCell::new(b"row".to_vec(), b"f".to_vec(), b"q".to_vec(), 0, Vec::new())],
    );
    let frame = encode_record(&record).unwrap();

    let mut cursor = Cursor::new(frame.as_ref());
    let decoded = read_record(&mut cursor).unwrap().unwrap();

    assert!(decoded.edits[0].value.is_empty());
    assert_eq!(record, decoded);
}

#[test]
fn test_encode_decode_block_sized_value() {
    // A value larger than a typical storage block must survive intact
    let value = vec![0xABu8; 1025 * 1024];
    let record = LogRecord::new(
        LogKey::new(b"r".to_vec(), b"t".to_vec(), 9, 0),
        vec![EditCell::new(b"row".to_vec(), b"f".to_vec(), b"q".to_vec(), 0, value.clone())],
    );
    let frame = encode_record(&record).unwrap();

    let mut cursor = Cursor::new(frame.as_ref());
    let decoded = read_record(&mut cursor).unwrap().unwrap();

    assert_eq!(decoded.edits[0].value, value);
}

#[test]
fn test_decode_stream_of_records() {
    let mut stream = Vec::new();
    for seq in 1..=5 {
        stream.extend_from_slice(&encode_record(&sample_record(seq, 2)).unwrap());
    }

    let mut cursor = Cursor::new(stream.as_slice());
    for seq in 1..=5 {
        let record = read_record(&mut cursor).unwrap().unwrap();
        assert_eq!(record.key.sequence_number, seq);
    }
    assert!(read_record(&mut cursor).unwrap().is_none());
}

// =============================================================================
// Flush-Marker Tests
// =============================================================================

#[test]
fn test_flush_marker_uses_reserved_sentinels() {
    let marker = LogRecord::flush_marker(b"region-1".to_vec(), b"table-1".to_vec(), 5, 123);

    assert!(marker.is_flush_marker());
    assert_eq!(marker.edits.len(), 1);
    assert_eq!(marker.edits[0].row, META_ROW);
    assert_eq!(marker.edits[0].family, META_FAMILY);
    assert_eq!(marker.edits[0].value, FLUSH_COMPLETE);
}

#[test]
fn test_ordinary_record_is_not_flush_marker() {
    assert!(!sample_record(1, 1).is_flush_marker());
}

#[test]
fn test_flush_marker_survives_round_trip() {
    let marker = LogRecord::flush_marker(b"r".to_vec(), b"t".to_vec(), 8, 99);
    let frame = encode_record(&marker).unwrap();

    let mut cursor = Cursor::new(frame.as_ref());
    let decoded = read_record(&mut cursor).unwrap().unwrap();

    assert!(decoded.is_flush_marker());
    assert_eq!(decoded.key.sequence_number, 8);
}

// =============================================================================
// Truncation and Corruption Tests
// =============================================================================

#[test]
fn test_empty_stream_reads_as_end() {
    let mut cursor = Cursor::new(&[] as &[u8]);
    assert!(read_record(&mut cursor).unwrap().is_none());
}

#[test]
fn test_truncated_header_reads_as_end() {
    let frame = encode_record(&sample_record(1, 1)).unwrap();
    // Only part of the header made it to disk
    let mut cursor = Cursor::new(&frame[..HEADER_SIZE / 2]);
    assert!(read_record(&mut cursor).unwrap().is_none());
}

#[test]
fn test_truncated_body_reads_as_end() {
    let frame = encode_record(&sample_record(1, 1)).unwrap();
    // Header landed, body was cut short
    let mut cursor = Cursor::new(&frame[..frame.len() - 3]);
    assert!(read_record(&mut cursor).unwrap().is_none());
}

#[test]
fn test_flipped_body_byte_is_corruption() {
    let mut frame = encode_record(&sample_record(1, 1)).unwrap().to_vec();
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;

    let mut cursor = Cursor::new(frame.as_slice());
    let err = read_record(&mut cursor).unwrap_err();
    assert!(err.is_corruption(), "expected corruption, got: {}", err);
}

#[test]
fn test_garbage_length_field_is_corruption() {
    // A length beyond MAX_RECORD_SIZE means the header itself is garbage
    let mut frame = vec![0u8; HEADER_SIZE];
    frame[4..8].copy_from_slice(&(MAX_RECORD_SIZE + 1).to_be_bytes());

    let mut cursor = Cursor::new(frame.as_slice());
    let err = read_record(&mut cursor).unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_header_size_constant() {
    // CRC(4) + Len(4)
    assert_eq!(HEADER_SIZE, 8);
}
