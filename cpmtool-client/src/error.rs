//! Client error types.

use crate::envelope::Envelope;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Code reported for any failure that carries no code of its own.
pub const GENERIC_FAILURE_CODE: i64 = 1;

/// Errors that can occur while talking to the service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("device resolution failed: {0}")]
    Device(#[from] cpmtool_device::DeviceError),

    #[error("authentication required")]
    AuthRequired,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Numeric code for callers that expect one (`login`/`register`).
    #[must_use]
    pub fn code(&self) -> i64 {
        GENERIC_FAILURE_CODE
    }

    /// Converts the error into the uniform failure envelope for `endpoint`.
    #[must_use]
    pub fn into_envelope(self, endpoint: &str) -> Envelope {
        let message = match endpoint {
            "check_device" => "Device check failed".to_string(),
            "get_key_data" => "Failed to get key data".to_string(),
            "get_data" => "Failed to get player data".to_string(),
            _ => format!("Request to {endpoint} failed"),
        };
        Envelope::failure(message)
    }
}
