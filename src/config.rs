//! Run configuration shared by every pipeline stage.
//!
//! A [`ScanConfig`] is built once at startup and handed to the pipeline.
//! Stages read from it; nothing mutates it after validation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 200;

/// Default number of concurrent probes.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Default total request timeout (tolerates large archive downloads).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Hard ceiling on a buffered response body (100 MiB).
pub const MAX_BODY_BYTES: u64 = 100 * 1024 * 1024;

/// Default directory for saved archives.
pub const DEFAULT_OUTPUT_DIR: &str = "./out";

/// Default number of save workers.
pub const DEFAULT_SAVE_WORKERS: usize = 10;

/// Default buffer between stages. Small on purpose: a full downstream stage
/// must block the upstream sender.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Errors for invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Concurrency outside the accepted range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// A zero timeout would fail every probe immediately.
    #[error("timeout must be at least one second")]
    ZeroTimeout,

    /// Zero-capacity stage buffers or worker pools cannot make progress.
    #[error("{field} must be greater than zero")]
    ZeroValue {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Settings for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of fetch workers.
    pub concurrency: usize,
    /// Total per-request timeout.
    pub timeout: Duration,
    /// Whether matched archives are downloaded and saved.
    pub download: bool,
    /// Directory receiving saved archives and the index log.
    pub output_dir: PathBuf,
    /// Largest body the probe stage will buffer.
    pub max_body_bytes: u64,
    /// Number of save workers.
    pub save_workers: usize,
    /// Buffer size of each inter-stage channel.
    pub channel_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            download: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_body_bytes: MAX_BODY_BYTES,
            save_workers: DEFAULT_SAVE_WORKERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ScanConfig {
    /// Checks that every value lets the pipeline make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency {
                value: self.concurrency,
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.save_workers == 0 {
            return Err(ConfigError::ZeroValue {
                field: "save_workers",
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                field: "channel_capacity",
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::ZeroValue {
                field: "max_body_bytes",
            });
        }
        Ok(())
    }

    /// Number of classify workers: half the fetch workers, at least one.
    #[must_use]
    pub fn classify_workers(&self) -> usize {
        (self.concurrency / 2).max(1)
    }
}
