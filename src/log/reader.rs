//! Durable Log Reader
//!
//! Sequential, forward-only iteration over one persisted log file. Used by
//! the splitter, by recovery consumers replaying per-region logs, and by
//! tests inspecting what actually landed on disk.
//!
//! A reader may be opened against a file that another handle is still
//! appending to. Before a sync it may observe a truncated tail - that reads
//! as end-of-stream, never as a partial record. After a sync, everything
//! appended before the sync is visible exactly once.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::{read_record, LogRecord};
use crate::store::ReadHandle;

/// Reads records back from a log file in append order
pub struct LogReader {
    input: ReadHandle,
}

impl LogReader {
    /// Open a log file for reading; fails if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let input = ReadHandle::open(path.as_ref())?;
        Ok(Self { input })
    }

    /// Produce the next complete record, or `None` when no more complete
    /// records are available at call time
    ///
    /// Returns `Err(Corruption)` if bytes are present but fail checksum or
    /// decoding; a tail cut short by an in-progress writer is not an error.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>> {
        read_record(&mut self.input)
    }

    /// Path of the file being read
    pub fn path(&self) -> PathBuf {
        self.input.path().to_path_buf()
    }

    /// Current on-disk length of the file, correct even while another
    /// handle is appending to it
    pub fn len(&self) -> Result<u64> {
        self.input.len()
    }

    /// Consume the reader into an iterator over records
    pub fn records(self) -> RecordIterator {
        RecordIterator {
            reader: self,
            done: false,
        }
    }

    /// Release the underlying file handle
    pub fn close(self) {}
}

/// Iterator over the records of one log file
///
/// Fuses after the first `None` or error; restart by reopening the file.
pub struct RecordIterator {
    reader: LogReader,
    done: bool,
}

impl Iterator for RecordIterator {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
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
