//! Host platform probing.
//!
//! [`Platform`] is the seam between the resolver and the operating system:
//! platform classification, running probe commands, and the network
//! hostname. [`HostPlatform`] talks to the real machine.

use crate::error::{DeviceError, DeviceResult};
use async_trait::async_trait;
use std::env;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Default upper bound for a single probe command.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Android system property file.
const ANDROID_BUILD_PROP: &str = "/system/build.prop";

/// Environment variable set by the Android runtime.
const ANDROID_ROOT_VAR: &str = "ANDROID_ROOT";

/// Kernel identification string on Linux-like systems.
const KERNEL_VERSION_FILE: &str = "/proc/version";

/// Desktop operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    /// Classifies an `std::env::consts::OS` value.
    #[must_use]
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }

    /// The family of the running binary.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os_name(env::consts::OS)
    }
}

/// Captured output of a probe command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit status description, for error messages.
    pub status: String,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
}

impl CommandOutput {
    /// Convenience constructor for a successful run.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: stdout.into(),
        }
    }

    /// Returns stdout if the command succeeded, an error otherwise.
    pub fn into_checked(self, program: &str) -> DeviceResult<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(DeviceError::CommandFailed {
                program: program.to_string(),
                status: self.status,
            })
        }
    }
}

/// Operating system capabilities used to detect a device name.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Desktop OS family of this host.
    fn os_family(&self) -> OsFamily;

    /// Whether this host looks like an Android device.
    ///
    /// Implementations must not fail; an inconclusive probe reads as `false`.
    fn is_android(&self) -> bool;

    /// Runs `program` with `args` and captures its output.
    async fn run(&self, program: &str, args: &[&str]) -> DeviceResult<CommandOutput>;

    /// Returns the network hostname.
    fn hostname(&self) -> DeviceResult<String>;
}

/// The machine this process runs on.
#[derive(Debug, Clone)]
pub struct HostPlatform {
    probe_timeout: Duration,
}

impl HostPlatform {
    /// Creates a host platform with the given per-command timeout.
    #[must_use]
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl Platform for HostPlatform {
    fn os_family(&self) -> OsFamily {
        OsFamily::current()
    }

    fn is_android(&self) -> bool {
        cfg!(target_os = "android")
            || Path::new(ANDROID_BUILD_PROP).exists()
            || env::var_os(ANDROID_ROOT_VAR).is_some()
            || kernel_info().to_lowercase().contains("android")
    }

    async fn run(&self, program: &str, args: &[&str]) -> DeviceResult<CommandOutput> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);
        let output = tokio::time::timeout(self.probe_timeout, command.output())
            .await
            .map_err(|_| DeviceError::Timeout(program.to_string()))??;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn hostname(&self) -> DeviceResult<String> {
        hostname::get()?
            .into_string()
            .map_err(|_| DeviceError::Probe("hostname is not valid UTF-8".to_string()))
    }
}

/// Kernel identification string, empty when unavailable.
fn kernel_info() -> String {
    std::fs::read_to_string(KERNEL_VERSION_FILE).unwrap_or_default()
}
