//! Configuration for hashing passes.
//!
//! [`ProcessConfig`] controls how a buffer is sliced, how often progress is
//! reported and how often the pass yields back to its host.
//!
//! # Example
//!
//! ```
//! use docseal::ProcessConfig;
//! use std::time::Duration;
//!
//! let config = ProcessConfig::default()
//!     .with_chunk_size(1024 * 1024)
//!     .with_progress_interval(Duration::from_millis(100));
//! config.validate()?;
//!
//! # Ok::<(), docseal::ValidateError>(())
//! ```

use std::time::Duration;

use crate::error::ValidateError;
use crate::hash::BLOCK_SIZE;

/// Default chunk size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default minimum time between two intermediate progress events.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(30);

/// Default number of bytes hashed between cooperative yields (4 MiB).
pub const DEFAULT_YIELD_INTERVAL: usize = 4 * 1024 * 1024;

/// Inputs above this size (100 MiB) get a larger minimum chunk size.
pub const LARGE_INPUT_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Minimum chunk size used for inputs above [`LARGE_INPUT_THRESHOLD`] (2 MiB).
pub const LARGE_INPUT_MIN_CHUNK: usize = 2 * 1024 * 1024;

/// Default upper bound on the size of a validation block that is parsed (1 MiB).
pub const DEFAULT_MAX_BLOCK_LEN: usize = 1024 * 1024;

/// Configuration for a validation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "protocol",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct ProcessConfig {
    chunk_size: usize,
    progress_interval_ms: u64,
    yield_interval: usize,
    max_block_len: usize,
}

impl ProcessConfig {
    /// Creates a configuration with the given chunk size and default intervals.
    ///
    /// Returns error if the chunk size is zero or above [`MAX_CHUNK_SIZE`].
    pub fn new(chunk_size: usize) -> Result<Self, ValidateError> {
        let config = Self::default().with_chunk_size(chunk_size);
        config.validate()?;
        Ok(config)
    }

    /// Sets the requested chunk size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the minimum time between intermediate progress events.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Sets the number of bytes hashed between cooperative yields.
    pub fn with_yield_interval(mut self, bytes: usize) -> Self {
        self.yield_interval = bytes;
        self
    }

    /// Sets the largest validation block whose metadata is parsed.
    pub fn with_max_block_len(mut self, bytes: usize) -> Self {
        self.max_block_len = bytes;
        self
    }

    /// Returns the requested chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the minimum time between intermediate progress events.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Returns the number of bytes hashed between cooperative yields.
    pub fn yield_interval(&self) -> usize {
        self.yield_interval
    }

    /// Returns the largest validation block whose metadata is parsed.
    pub fn max_block_len(&self) -> usize {
        self.max_block_len
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.chunk_size == 0 {
            return Err(ValidateError::invalid_config("chunk size must be non-zero"));
        }

        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ValidateError::invalid_config(format!(
                "chunk size {} exceeds maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }

        if self.yield_interval == 0 {
            return Err(ValidateError::invalid_config("yield interval must be non-zero"));
        }

        if self.max_block_len == 0 {
            return Err(ValidateError::invalid_config("max block length must be non-zero"));
        }

        Ok(())
    }

    /// Chunk size actually used for an input of `total` bytes.
    ///
    /// Large inputs get at least [`LARGE_INPUT_MIN_CHUNK`]. The result is a
    /// multiple of the SHA-256 block size and never smaller than one block.
    pub fn effective_chunk_size(&self, total: u64) -> usize {
        let mut size = self.chunk_size.min(MAX_CHUNK_SIZE);
        if total > LARGE_INPUT_THRESHOLD {
            size = size.max(LARGE_INPUT_MIN_CHUNK);
        }
        (size / BLOCK_SIZE * BLOCK_SIZE).max(BLOCK_SIZE)
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL.as_millis() as u64,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            max_block_len: DEFAULT_MAX_BLOCK_LEN,
        }
    }
}
