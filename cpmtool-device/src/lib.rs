//! Device identity resolution for cpmtool.
//!
//! Every call the service accepts is bound to a human-readable device name.
//! This crate works that name out once and remembers it:
//! - A cached name in a small JSON file wins outright
//! - Otherwise the host is probed (Android properties, or the desktop
//!   model/computer name/hostname)
//! - Otherwise the user is asked through an injectable [`NamePrompt`]
//!
//! Whatever name is obtained is written back to the cache file on a best
//! effort basis. Loopback names such as `localhost` are never accepted as a
//! device identity, see [`DeviceName::parse`].

mod cache;
mod error;
mod name;
mod platform;
mod prompt;
mod resolver;

pub use cache::{DeviceCache, DEFAULT_CACHE_FILE};
pub use error::{DeviceError, DeviceResult};
pub use name::DeviceName;
pub use platform::{CommandOutput, HostPlatform, OsFamily, Platform, DEFAULT_PROBE_TIMEOUT};
pub use prompt::{FixedPrompt, NamePrompt, NoPrompt, StdinPrompt, MANUAL_ENTRY_MESSAGE};
pub use resolver::{
    DeviceResolver, ANDROID_FALLBACK_NAME, ANDROID_PROPERTIES, MAX_PROMPT_ATTEMPTS,
    UNKNOWN_DEVICE_NAME,
};
