//! # regionlog
//!
//! The write-ahead log of a region-partitioned key-value store:
//! - One physical log stream shared by every region a server hosts
//! - Globally monotonic sequence numbers, preserved across file rolls
//! - Explicit sync contract: synced = durable, unsynced = no guarantee
//! - Post-failure split of a dead server's log into per-region replay logs
//! - Cache-flush markers so replay skips already-persisted edits
//!
//! ## Architecture Overview
//!
//! ```text
//!   region A ──┐
//!   region B ──┼─ append ─▶ ┌────────────┐    sync    ┌──────────────┐
//!   region C ──┘            │ LogWriter  │ ─────────▶ │ wal_NNNN.log │
//!                           │ (seq, roll)│            │ (per file #) │
//!                           └────────────┘            └──────┬───────┘
//!                                                            │ crash
//!                                                            ▼
//!                           ┌────────────┐  records  ┌──────────────┐
//!                           │ LogReader  │ ◀──────── │ LogSplitter  │
//!                           └────────────┘           │ (per region) │
//!                                                    └──────┬───────┘
//!                                                           ▼
//!                                          recovered_<region>.log ─▶ replay
//! ```
//!
//! ## Durability Contract
//!
//! `append` returns a sequence number but guarantees nothing by itself.
//! After `sync` returns, every record appended before the call is readable
//! by any reader, exactly once, on record boundaries. A record that was
//! appended but never synced is "possibly lost, possibly present" - a
//! crash may or may not have kept it.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod log;
pub mod record;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::LogConfig;
pub use error::{LogError, Result};
pub use log::{recovered_file_name, LogReader, LogSplitter, LogWriter, RecordIterator};
pub use record::{EditCell, LogKey, LogRecord, FLUSH_COMPLETE, META_FAMILY, META_ROW};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of regionlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
