//! Log Splitter
//!
//! Post-failure recovery step: takes the log directory a dead writer left
//! behind and regroups its interleaved records into one replay log per
//! region.
//!
//! ## Algorithm
//! 1. Enumerate the directory's log files by file number
//! 2. Read every record of every file in append order
//! 3. Group records per region in an in-memory arena (ordered by region id)
//! 4. Sort each region's records by sequence number - the sequence number,
//!    not file order, is the source of truth for what happened before what
//! 5. Write one output file per non-empty region, sync it, close it
//!
//! A record that fails checksum or decoding aborts the whole split:
//! replay correctness depends on completeness, so a visible failure beats a
//! silently dropped tail.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::LogConfig;
use crate::error::{LogError, Result};
use crate::record::{encode_record, LogRecord};
use crate::store::AppendHandle;

use super::{list_log_files, log_file_path, LogReader};

/// Output filename for a region's recovered log
///
/// The region id is hex-encoded so arbitrary region bytes map to distinct,
/// filesystem-safe names.
pub fn recovered_file_name(region_id: &[u8]) -> String {
    let mut hex = String::with_capacity(region_id.len() * 2);
    for b in region_id {
        hex.push_str(&format!("{:02x}", b));
    }
    format!("recovered_{}.log", hex)
}

/// Splits abandoned log directories into per-region replay logs
pub struct LogSplitter;

impl LogSplitter {
    /// Split every log file under `abandoned_dir` into per-region logs
    /// under `recovery_dir`
    ///
    /// Returns the output paths, one per region that had at least one
    /// record, ordered by region id. Empty input files are skipped; a
    /// corrupt record aborts the split.
    pub fn split(recovery_dir: &Path, abandoned_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(recovery_dir)?;

        let filenums = list_log_files(abandoned_dir)?;

        // Arena of per-region record buffers, keyed by region id
        let mut regions: BTreeMap<Vec<u8>, Vec<LogRecord>> = BTreeMap::new();
        let mut files_read = 0usize;
        let mut records_read = 0usize;

        for filenum in filenums {
            let path = log_file_path(abandoned_dir, filenum);

            let mut reader = LogReader::open(&path)?;
            if reader.len()? == 0 {
                debug!(path = %path.display(), "skipping empty log file");
                continue;
            }
            while let Some(record) = reader
                .next_record()
                .map_err(|e| in_file(e, &path))?
            {
                records_read += 1;
                regions
                    .entry(record.key.region_id.clone())
                    .or_default()
                    .push(record);
            }
            files_read += 1;
        }

        // One output log per region, records ordered by sequence number.
        // A region's records may span input files, so the per-file order is
        // not enough on its own.
        let config = LogConfig::default();
        let mut outputs = Vec::with_capacity(regions.len());

        for (region_id, mut records) in regions {
            records.sort_by_key(|r| r.key.sequence_number);

            let out_path = recovery_dir.join(recovered_file_name(&region_id));

            // An interrupted earlier split may have left a partial output
            match fs::remove_file(&out_path) {
                Ok(()) => debug!(path = %out_path.display(), "replacing stale recovered log"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            let mut out = AppendHandle::create(&out_path, config.write_buffer_size)?;
            for record in &records {
                out.append(&encode_record(record)?)?;
            }
            out.close()?;

            debug!(
                region = %String::from_utf8_lossy(&region_id),
                records = records.len(),
                path = %out_path.display(),
                "wrote recovered region log"
            );
            outputs.push(out_path);
        }

        info!(
            src = %abandoned_dir.display(),
            files = files_read,
            records = records_read,
            regions = outputs.len(),
            "split log directory"
        );

        Ok(outputs)
    }
}

/// Attach the offending file path to a corruption error
fn in_file(err: LogError, path: &Path) -> LogError {
    match err {
        LogError::Corruption(msg) => {
            LogError::Corruption(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}
