//! Fire-and-forget error reporting.
//!
//! Reports are posted to the service's `errors` endpoint from a background
//! task. The caller never learns about the outcome; at most it waits for
//! delivery to finish before shutting down.

use crate::credentials::AccessKey;
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Device name sent when no name has been resolved yet.
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Body of an error report.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error_message: String,
    pub endpoint: String,
    pub method: String,
    pub device_name: String,
    pub access_key: String,
}

/// Posts [`ErrorReport`]s in the background.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    http: Client,
    url: String,
    access_key: AccessKey,
    enabled: bool,
}

impl ErrorReporter {
    /// Creates a reporter posting to `url`, giving up after `timeout`.
    pub fn new(
        url: String,
        access_key: AccessKey,
        timeout: Duration,
        enabled: bool,
    ) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url,
            access_key,
            enabled,
        })
    }

    /// Returns whether reports are sent at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reports a failure of `method endpoint`.
    ///
    /// Returns the handle of the spawned task, or `None` when reporting is
    /// disabled. Dropping the handle does not cancel the report.
    pub fn report(
        &self,
        error_message: String,
        endpoint: &str,
        method: &str,
        device_name: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        self.delivery(error_message, endpoint, method, device_name)
            .map(tokio::spawn)
    }

    /// Builds the future that posts one report, for callers that track
    /// their own tasks. `None` when reporting is disabled.
    pub fn delivery(
        &self,
        error_message: String,
        endpoint: &str,
        method: &str,
        device_name: Option<&str>,
    ) -> Option<impl Future<Output = ()> + Send + use<>> {
        if !self.enabled {
            return None;
        }

        let report = ErrorReport {
            error_message,
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            device_name: device_name.unwrap_or(UNKNOWN_DEVICE).to_string(),
            access_key: self.access_key.as_str().to_string(),
        };
        let http = self.http.clone();
        let url = self.url.clone();

        Some(async move {
            match http.post(&url).json(&report).send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(
                        "Error report for {} rejected: HTTP {}",
                        report.endpoint,
                        response.status()
                    );
                }
                Ok(_) => debug!("Error report for {} delivered", report.endpoint),
                Err(e) => debug!("Error report for {} not delivered: {}", report.endpoint, e),
            }
        })
    }
}
