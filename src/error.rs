//! Error types for regionlog
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for regionlog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("log corruption detected: {0}")]
    Corruption(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Writer Contract Errors
    // -------------------------------------------------------------------------
    #[error("append requires at least one edit cell")]
    EmptyEdits,

    #[error("append requires a non-empty region id")]
    EmptyRegion,

    #[error("no cache flush in progress: {0}")]
    FlushNotStarted(String),

    #[error("log writer is closed")]
    Closed,
}

impl LogError {
    /// True if the error indicates on-disk corruption rather than a
    /// transient or caller-side failure.
    pub fn is_corruption(&self) -> bool {
        matches!(self, LogError::Corruption(_))
    }
}
