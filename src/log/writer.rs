//! Durable Log Writer
//!
//! Owns the active log file, assigns sequence numbers, and drives sync and
//! roll. One writer serves appends from many threads.
//!
//! ## Concurrency Model: Single-Writer / Multiple-Appenders
//!
//! - All mutation of the active file goes through one internal mutex:
//!   append, sync, roll, and the flush-marker operations are mutually
//!   exclusive, so a sync always captures a consistent prefix of appends
//!   and no two records interleave on disk.
//! - The sequence counter is an atomic advanced only while that mutex is
//!   held; a failed append never advances it.
//! - Readers are separate handles (see [`LogReader`](crate::LogReader))
//!   and take no lock here.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LogConfig;
use crate::error::{LogError, Result};
use crate::record::{encode_record, read_record, EditCell, LogKey, LogRecord};
use crate::store::{AppendHandle, ReadHandle};

use super::{list_log_files, log_file_path};

/// Appends records to the log, one active file at a time
pub struct LogWriter {
    /// Directory holding every file this writer produces
    dir: PathBuf,

    config: LogConfig,

    /// Highest sequence number assigned so far. Advanced only under
    /// `inner`'s lock; read lock-free by `current_sequence`.
    sequence: AtomicU64,

    /// Everything that touches the active file
    inner: Mutex<WriterInner>,
}

struct WriterInner {
    /// Active file handle; `None` once closed
    out: Option<AppendHandle>,

    /// Number of the active file
    filenum: u64,

    /// Every file number this writer has created, for close_and_delete
    produced: Vec<u64>,

    /// Regions with a cache flush in progress: region id -> watermark
    pending_flushes: HashMap<Vec<u8>, u64>,
}

impl LogWriter {
    /// Open a writer over a log directory
    ///
    /// Creates the directory if needed. If the directory already holds log
    /// files from an earlier writer, the new writer starts at the next file
    /// number and resumes the sequence counter above the highest sequence
    /// found in the newest non-empty file; old files are left untouched.
    pub fn open(dir: impl AsRef<Path>, config: LogConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let existing = list_log_files(&dir)?;

        let next_filenum = existing.last().map(|&n| n + 1).unwrap_or(1);
        let start_sequence = Self::recover_sequence(&dir, &existing)?;

        let path = log_file_path(&dir, next_filenum);
        let out = AppendHandle::create(&path, config.write_buffer_size)?;

        info!(
            dir = %dir.display(),
            filenum = next_filenum,
            sequence = start_sequence,
            "opened log writer"
        );

        Ok(Self {
            dir,
            config,
            sequence: AtomicU64::new(start_sequence),
            inner: Mutex::new(WriterInner {
                out: Some(out),
                filenum: next_filenum,
                produced: vec![next_filenum],
                pending_flushes: HashMap::new(),
            }),
        })
    }

    /// Scan existing files, newest first, for the highest sequence number
    ///
    /// A file may be empty (rolled, then nothing appended before the crash),
    /// so keep walking back until records turn up. A truncated tail is
    /// expected here and simply ends the scan of that file.
    fn recover_sequence(dir: &Path, existing: &[u64]) -> Result<u64> {
        for &filenum in existing.iter().rev() {
            let path = log_file_path(dir, filenum);
            let mut input = ReadHandle::open(&path)?;

            let mut max_seq = None;
            while let Some(record) = read_record(&mut input)? {
                max_seq = Some(record.key.sequence_number);
            }

            if let Some(seq) = max_seq {
                debug!(filenum, sequence = seq, "recovered sequence counter");
                return Ok(seq);
            }
        }
        Ok(0)
    }

    // =========================================================================
    // Append Path
    // =========================================================================

    /// Append one record for a region and return its sequence number
    ///
    /// The record lands in the write buffer only; call [`sync`](Self::sync)
    /// for durability. Rejects empty `edits` and an empty `region_id`
    /// synchronously. On an I/O failure nothing is considered appended and
    /// the sequence counter does not move.
    pub fn append(
        &self,
        region_id: &[u8],
        table_id: &[u8],
        edits: Vec<EditCell>,
        write_time: u64,
    ) -> Result<u64> {
        if edits.is_empty() {
            return Err(LogError::EmptyEdits);
        }
        if region_id.is_empty() {
            return Err(LogError::EmptyRegion);
        }

        let mut inner = self.inner.lock();

        let sequence = self.sequence.load(Ordering::SeqCst) + 1;
        let key = LogKey::new(region_id, table_id, sequence, write_time);
        let frame = encode_record(&LogRecord::new(key, edits))?;

        let out = inner.out.as_mut().ok_or(LogError::Closed)?;
        out.append(&frame)?;

        // The record is fully buffered; only now does the number count as
        // assigned.
        self.sequence.store(sequence, Ordering::SeqCst);

        self.maybe_roll(&mut inner)?;

        Ok(sequence)
    }

    /// Force everything appended so far out to durable storage
    ///
    /// After this returns, a reader opened on the active file sees every
    /// record appended before the call - exactly once, on record
    /// boundaries.
    pub fn sync(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let out = inner.out.as_mut().ok_or(LogError::Closed)?;
        out.sync()?;
        debug!(filenum = inner.filenum, "synced log file");
        Ok(())
    }

    /// Close the active file durably and start appending to the next one
    ///
    /// Returns the new file number. The sequence counter keeps increasing
    /// across the roll.
    pub fn roll_writer(&self) -> Result<u64> {
        let mut inner = self.inner.lock();
        self.roll_locked(&mut inner)
    }

    fn roll_locked(&self, inner: &mut WriterInner) -> Result<u64> {
        let out = inner.out.take().ok_or(LogError::Closed)?;
        let closed_bytes = out.written();
        out.close()?;

        inner.filenum += 1;
        let path = log_file_path(&self.dir, inner.filenum);
        inner.out = Some(AppendHandle::create(&path, self.config.write_buffer_size)?);
        inner.produced.push(inner.filenum);

        info!(
            filenum = inner.filenum,
            closed_bytes,
            sequence = self.sequence.load(Ordering::SeqCst),
            "rolled log writer"
        );

        Ok(inner.filenum)
    }

    /// Roll if the active file has outgrown the configured threshold
    fn maybe_roll(&self, inner: &mut WriterInner) -> Result<()> {
        if let Some(limit) = self.config.roll_size_limit {
            let written = inner.out.as_ref().ok_or(LogError::Closed)?.written();
            if written >= limit {
                self.roll_locked(inner)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Cache-Flush Marker Protocol
    // =========================================================================

    /// Begin a cache flush for a region and return the watermark
    ///
    /// The watermark is the sequence-number high-water mark at call time:
    /// once the region's memstore is persisted, every record of that region
    /// at or below the watermark is replay-irrelevant. The flush must be
    /// finished with [`complete_cache_flush`](Self::complete_cache_flush)
    /// (or abandoned with [`abort_cache_flush`](Self::abort_cache_flush)).
    pub fn start_cache_flush(&self, region_id: &[u8], _table_id: &[u8]) -> Result<u64> {
        let mut inner = self.inner.lock();
        if inner.out.is_none() {
            return Err(LogError::Closed);
        }

        let watermark = self.sequence.load(Ordering::SeqCst);
        inner.pending_flushes.insert(region_id.to_vec(), watermark);

        debug!(
            region = %String::from_utf8_lossy(region_id),
            watermark,
            "started cache flush"
        );

        Ok(watermark)
    }

    /// Append the complete-flush marker record for a region
    ///
    /// Rejects a region with no matching [`start_cache_flush`] or with a
    /// different watermark than the one handed out.
    pub fn complete_cache_flush(
        &self,
        region_id: &[u8],
        table_id: &[u8],
        watermark: u64,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.out.is_none() {
            return Err(LogError::Closed);
        }

        match inner.pending_flushes.get(region_id) {
            None => {
                return Err(LogError::FlushNotStarted(format!(
                    "region {:?} has no flush in progress",
                    String::from_utf8_lossy(region_id)
                )));
            }
            Some(&started) if started != watermark => {
                return Err(LogError::FlushNotStarted(format!(
                    "region {:?} started a flush at watermark {}, not {}",
                    String::from_utf8_lossy(region_id),
                    started,
                    watermark
                )));
            }
            Some(_) => {}
        }

        let sequence = self.sequence.load(Ordering::SeqCst) + 1;
        let marker =
            LogRecord::flush_marker(region_id, table_id, sequence, unix_millis());
        let frame = encode_record(&marker)?;

        let out = inner.out.as_mut().ok_or(LogError::Closed)?;
        out.append(&frame)?;
        self.sequence.store(sequence, Ordering::SeqCst);

        inner.pending_flushes.remove(region_id);

        debug!(
            region = %String::from_utf8_lossy(region_id),
            watermark,
            sequence,
            "completed cache flush"
        );

        self.maybe_roll(&mut inner)?;
        Ok(())
    }

    /// Abandon a started cache flush so the memstore flush can retry later
    ///
    /// A no-op if the region has no flush in progress.
    pub fn abort_cache_flush(&self, region_id: &[u8]) {
        let mut inner = self.inner.lock();
        if inner.pending_flushes.remove(region_id).is_some() {
            debug!(
                region = %String::from_utf8_lossy(region_id),
                "aborted cache flush"
            );
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Flush, sync, and close the active file; rolled files are kept
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(out) = inner.out.take() {
            out.close()?;
            info!(filenum = inner.filenum, "closed log writer");
        }
        Ok(())
    }

    /// Close, then delete every file this writer ever produced
    ///
    /// Every deletion is attempted; the first failure is surfaced after
    /// the sweep so a later splitter run never sees half-deleted garbage
    /// silently.
    pub fn close_and_delete(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(out) = inner.out.take() {
            out.close()?;
        }

        let mut first_failure = None;
        for &filenum in &inner.produced {
            let path = log_file_path(&self.dir, filenum);
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to delete log file");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }

        info!(
            dir = %self.dir.display(),
            files = inner.produced.len(),
            "closed and deleted log"
        );
        inner.produced.clear();

        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Deterministic path for a file number under this writer's directory
    ///
    /// Pure function of the file number; performs no I/O and is independent
    /// of writer state.
    pub fn compute_filename(&self, filenum: u64) -> PathBuf {
        log_file_path(&self.dir, filenum)
    }

    /// Number of the active (or last active, if closed) log file
    pub fn current_filenum(&self) -> u64 {
        self.inner.lock().filenum
    }

    /// Highest sequence number assigned so far
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Every file number this writer has created, oldest first
    pub fn produced_filenums(&self) -> Vec<u64> {
        self.inner.lock().produced.clone()
    }

    /// The log directory
    pub fn log_dir(&self) -> &Path {
        &self.dir
    }
}

/// Wall-clock milliseconds for marker records
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
