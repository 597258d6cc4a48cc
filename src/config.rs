//! Configuration for regionlog
//!
//! Centralized configuration with sensible defaults.

/// Configuration for a [`LogWriter`](crate::LogWriter) instance
///
/// The size threshold is the only automatic roll trigger; callers that need
/// time-based or externally coordinated rolling call
/// [`roll_writer`](crate::LogWriter::roll_writer) themselves.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Roll to a new log file once the active file grows past this many
    /// bytes. `None` disables automatic rolling entirely.
    pub roll_size_limit: Option<u64>,

    /// Capacity of the in-memory write buffer in front of the log file.
    /// Unsynced appends may sit in this buffer, invisible to readers.
    pub write_buffer_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            roll_size_limit: Some(64 * 1024 * 1024), // 64 MB
            write_buffer_size: 64 * 1024,            // 64 KB
        }
    }
}

impl LogConfig {
    /// Create a new config builder
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    /// Set the automatic roll threshold in bytes
    pub fn roll_size_limit(mut self, bytes: u64) -> Self {
        self.config.roll_size_limit = Some(bytes);
        self
    }

    /// Disable automatic rolling (roll only on explicit request)
    pub fn manual_roll_only(mut self) -> Self {
        self.config.roll_size_limit = None;
        self
    }

    /// Set the write buffer capacity in bytes
    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.config.write_buffer_size = bytes;
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}
