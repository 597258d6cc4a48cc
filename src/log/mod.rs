//! Durable Log Module
//!
//! The write, read, and recovery sides of the log:
//!
//! ## Responsibilities
//! - Append records with globally increasing sequence numbers
//! - Explicit sync: synced = durable, unsynced = no guarantee
//! - Roll to a new file on size threshold or on demand
//! - Sequential reads that respect record boundaries
//! - Post-failure split of a log directory into per-region replay logs
//!
//! ## File Layout
//! ```text
//! {log_dir}/
//!   ├── wal_000000000001.log     (rolled, immutable)
//!   ├── wal_000000000002.log     (rolled, immutable)
//!   └── wal_000000000003.log     (active, exclusively owned by the writer)
//!
//! {recovery_dir}/
//!   └── recovered_<region-hex>.log   (one per region, after a split)
//! ```

mod reader;
mod split;
mod writer;

pub use reader::{LogReader, RecordIterator};
pub use split::{recovered_file_name, LogSplitter};
pub use writer::LogWriter;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Filename for a given log file number: `wal_000000000042.log`
pub(crate) fn log_file_name(filenum: u64) -> String {
    format!("wal_{:012}.log", filenum)
}

/// Full path for a log file number under a log directory
pub(crate) fn log_file_path(dir: &Path, filenum: u64) -> PathBuf {
    dir.join(log_file_name(filenum))
}

/// Parse the file number back out of a log file path
/// `wal_000000000042.log` -> `Some(42)`
pub(crate) fn parse_filenum(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_string_lossy();
    let stem = name.strip_suffix(".log")?;
    let num = stem.strip_prefix("wal_")?;
    num.parse().ok()
}

/// List the log file numbers present in a directory, ascending
///
/// Non-log files are ignored.
pub(crate) fn list_log_files(dir: &Path) -> Result<Vec<u64>> {
    let mut filenums = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            if let Some(n) = parse_filenum(&path) {
                filenums.push(n);
            }
        }
    }

    filenums.sort_unstable();
    Ok(filenums)
}
