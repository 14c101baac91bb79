//! Client configuration.

use crate::error::{ClientError, ClientResult};
use cpmtool_device::DEFAULT_CACHE_FILE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Production service base URL.
pub const DEFAULT_BASE_URL: &str = "https://kayzenn.squareweb.app/api";

/// Settings injected into [`crate::CpmClient`] at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint name is appended to.
    pub base_url: String,
    /// Where the resolved device name is cached.
    pub device_cache_path: PathBuf,
    /// Upper bound for a single device probe command.
    pub probe_timeout_secs: u64,
    /// Timeout for error reports.
    pub telemetry_timeout_secs: u64,
    /// Timeout for primary requests; `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Whether failures are reported to the service's error sink.
    pub report_errors: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            device_cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            probe_timeout_secs: 5,
            telemetry_timeout_secs: 5,
            request_timeout_secs: None,
            report_errors: true,
        }
    }
}

impl ClientConfig {
    /// Creates the default configuration pointed at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> ClientResult<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.telemetry_timeout_secs == 0 {
            return Err(ClientError::Config(
                "telemetry_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of `endpoint`.
    #[must_use]
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn telemetry_timeout(&self) -> Duration {
        Duration::from_secs(self.telemetry_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
