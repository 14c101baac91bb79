//! On-disk device name cache.
//!
//! The cache is a single JSON object, `{"device_name": "<string>"}`. It is
//! only a hint: the service validates the name on every call.

use crate::error::DeviceResult;
use crate::name::DeviceName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default cache location, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = "device_token.json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    device_name: Option<String>,
}

/// Reads and writes the cached device name.
#[derive(Debug, Clone)]
pub struct DeviceCache {
    path: PathBuf,
}

impl DeviceCache {
    /// Creates a cache backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cache file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached name.
    ///
    /// A missing, unreadable or malformed file, or a name that fails
    /// [`DeviceName::parse`], is a miss.
    #[must_use]
    pub fn load(&self) -> Option<DeviceName> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No cached device name at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) => file.device_name.as_deref().and_then(DeviceName::parse),
            Err(e) => {
                debug!("Ignoring malformed device cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Writes `name` to the cache file, replacing its previous contents.
    pub fn save(&self, name: &DeviceName) -> DeviceResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            device_name: Some(name.as_str().to_string()),
        };
        std::fs::write(&self.path, serde_json::to_string(&file)?)?;
        Ok(())
    }
}

impl Default for DeviceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_FILE)
    }
}
