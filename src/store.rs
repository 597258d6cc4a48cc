//! Durable storage handles
//!
//! Capability split over one log file: an [`AppendHandle`] is the single
//! exclusive writer, a [`ReadHandle`] is a shared read-only view. The split
//! keeps concurrent writers out by construction - there is no way to obtain
//! two append handles to the same file, while any number of read handles
//! may be open against a file that is still being appended to.
//!
//! Durability contract: bytes passed to [`AppendHandle::append`] sit in a
//! user-space buffer until [`AppendHandle::sync`] flushes them and asks the
//! OS to persist (`fdatasync`). Only synced bytes carry a guarantee.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

// =============================================================================
// AppendHandle
// =============================================================================

/// Exclusive append-only handle to one log file
pub struct AppendHandle {
    path: PathBuf,
    out: BufWriter<File>,

    /// Bytes handed to this handle so far (buffered or flushed)
    written: u64,
}

impl AppendHandle {
    /// Create the file and take exclusive ownership of it
    ///
    /// Fails if the file already exists: log files are never reopened for
    /// append, a writer always moves on to the next file number.
    pub fn create(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::with_capacity(buffer_size, file),
            written: 0,
        })
    }

    /// Append bytes to the write buffer
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Flush the buffer and persist everything appended so far
    pub fn sync(&mut self) -> Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_data()?;
        Ok(())
    }

    /// Bytes handed to this handle since creation
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path of the owned file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync and release the handle; the file is immutable afterwards
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }
}

// =============================================================================
// ReadHandle
// =============================================================================

/// Shared read-only handle to a log file
///
/// May be opened while an [`AppendHandle`] to the same file is live; length
/// queries go to the filesystem each time, so a handle opened before a sync
/// observes the file growing.
pub struct ReadHandle {
    path: PathBuf,
    input: BufReader<File>,
}

impl ReadHandle {
    /// Open a file for reading; fails if it does not exist
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            input: BufReader::new(file),
        })
    }

    /// Current on-disk length, correct against a concurrently-open writer
    pub fn len(&self) -> Result<u64> {
        Ok(self.input.get_ref().metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for ReadHandle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Seek for ReadHandle {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match pos {
            // Relative seeks stay inside the read-ahead buffer when they can
            SeekFrom::Current(offset) => {
                self.input.seek_relative(offset)?;
                self.input.stream_position()
            }
            other => self.input.seek(other),
        }
    }
}
