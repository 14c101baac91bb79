//! Error types for device resolution.

use thiserror::Error;

/// Device resolution errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A probe produced output that could not be interpreted.
    #[error("device probe failed: {0}")]
    Probe(String),

    /// A probe command exited unsuccessfully.
    #[error("`{program}` exited with {status}")]
    CommandFailed {
        /// The program that was run.
        program: String,
        /// Exit status description.
        status: String,
    },

    /// A probe command did not finish in time.
    #[error("`{0}` timed out")]
    Timeout(String),

    /// The manual-entry prompt could not be read.
    #[error("device name prompt failed: {0}")]
    Prompt(String),

    /// No acceptable device name was entered.
    #[error("no valid device name entered after {0} attempts")]
    InvalidName(usize),

    /// Filesystem or process I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache file serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
