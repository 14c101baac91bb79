//! Device name resolution.
//!
//! Order of preference: in-process value, cache file, platform probes,
//! manual entry. Probe failures are never fatal; they only push resolution
//! further down that list.

use crate::cache::DeviceCache;
use crate::error::{DeviceError, DeviceResult};
use crate::name::DeviceName;
use crate::platform::{HostPlatform, OsFamily, Platform};
use crate::prompt::{MANUAL_ENTRY_MESSAGE, NamePrompt, StdinPrompt};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Name used for an Android device that exposes no readable properties.
pub const ANDROID_FALLBACK_NAME: &str = "Android Device";

/// Name used on operating systems without a known probe.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// How many times manual entry is retried before giving up.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

/// Which half of the composed Android name a property contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyKind {
    Brand,
    Model,
}

/// Android properties probed with `getprop`, in order.
///
/// The first non-empty value per kind wins. `ro.product.name` is still
/// queried but its answer never reaches the composed name.
pub const ANDROID_PROPERTIES: [&str; 6] = [
    "ro.product.model",
    "ro.product.brand",
    "ro.product.device",
    "ro.product.name",
    "ro.product.manufacturer",
    "ro.product.model",
];

fn property_kind(property: &str) -> Option<PropertyKind> {
    match property.rsplit('.').next() {
        Some("brand" | "manufacturer") => Some(PropertyKind::Brand),
        Some("model" | "device") => Some(PropertyKind::Model),
        _ => None,
    }
}

/// Resolves and remembers this machine's device name.
pub struct DeviceResolver {
    cache: DeviceCache,
    platform: Arc<dyn Platform>,
    prompt: Arc<dyn NamePrompt>,
    resolved: OnceCell<DeviceName>,
}

impl DeviceResolver {
    /// Creates a resolver for the real host, prompting on standard input.
    pub fn new(cache: DeviceCache) -> Self {
        Self::with_parts(cache, Arc::new(HostPlatform::default()), Arc::new(StdinPrompt))
    }

    /// Creates a resolver from explicit parts.
    pub fn with_parts(
        cache: DeviceCache,
        platform: Arc<dyn Platform>,
        prompt: Arc<dyn NamePrompt>,
    ) -> Self {
        Self {
            cache,
            platform,
            prompt,
            resolved: OnceCell::new(),
        }
    }

    /// Replaces the platform probes.
    #[must_use]
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the manual-entry fallback.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn NamePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Returns the cache backing this resolver.
    #[must_use]
    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// Returns the name resolved earlier in this process, if any.
    ///
    /// Never probes or prompts.
    #[must_use]
    pub fn cached(&self) -> Option<&DeviceName> {
        self.resolved.get()
    }

    /// Resolves the device name.
    ///
    /// Idempotent: once a name is known, later calls return it without
    /// touching the cache file, the platform or the prompt.
    ///
    /// # Errors
    ///
    /// Fails only when detection fell through to manual entry and the
    /// prompt could not produce a valid name.
    pub async fn resolve(&self) -> DeviceResult<DeviceName> {
        self.resolved
            .get_or_try_init(|| self.resolve_uncached())
            .await
            .cloned()
    }

    async fn resolve_uncached(&self) -> DeviceResult<DeviceName> {
        if let Some(name) = self.cache.load() {
            debug!("Using cached device name from {}", self.cache.path().display());
            return Ok(name);
        }

        let detected = match self.detect().await {
            Ok(raw) => {
                let parsed = DeviceName::parse(&raw);
                if parsed.is_none() {
                    warn!("Detected device name {:?} is not usable", raw);
                }
                parsed
            }
            Err(e) => {
                warn!("Device name detection failed: {}", e);
                None
            }
        };

        let name = match detected {
            Some(name) => name,
            None => self.ask_manually().await?,
        };

        if let Err(e) = self.cache.save(&name) {
            warn!(
                "Failed to save device name to {}: {}",
                self.cache.path().display(),
                e
            );
        }

        info!("Resolved device name: {}", name);
        Ok(name)
    }

    async fn detect(&self) -> DeviceResult<String> {
        if self.platform.is_android() {
            debug!("Android environment detected");
            return Ok(self.detect_android().await);
        }

        match self.platform.os_family() {
            OsFamily::Windows => {
                let stdout = self
                    .platform
                    .run("wmic", &["computersystem", "get", "model"])
                    .await?
                    .into_checked("wmic")?;
                stdout
                    .lines()
                    .nth(1)
                    .map(|line| line.trim().to_string())
                    .ok_or_else(|| DeviceError::Probe("wmic returned no model row".to_string()))
            }
            OsFamily::MacOs => {
                let stdout = self
                    .platform
                    .run("scutil", &["--get", "ComputerName"])
                    .await?
                    .into_checked("scutil")?;
                Ok(stdout.trim().to_string())
            }
            OsFamily::Linux => Ok(self.platform.hostname()?.trim().to_string()),
            OsFamily::Other => Ok(UNKNOWN_DEVICE_NAME.to_string()),
        }
    }

    /// Composes `"{brand} {model}"` from whichever properties answer.
    async fn detect_android(&self) -> String {
        let mut brand: Option<String> = None;
        let mut model: Option<String> = None;

        for property in ANDROID_PROPERTIES {
            let kind = property_kind(property);
            let filled = match kind {
                Some(PropertyKind::Brand) => brand.is_some(),
                Some(PropertyKind::Model) => model.is_some(),
                None => false,
            };
            if filled {
                continue;
            }

            let value = match self.platform.run("getprop", &[property]).await {
                Ok(output) => output.stdout.trim().to_string(),
                Err(e) => {
                    debug!("getprop {} failed: {}", property, e);
                    continue;
                }
            };
            if value.is_empty() {
                continue;
            }
            match kind {
                Some(PropertyKind::Brand) => brand = Some(value),
                Some(PropertyKind::Model) => model = Some(value),
                None => debug!("Ignoring {} = {:?}", property, value),
            }
        }

        match (brand, model) {
            (Some(brand), Some(model)) => format!("{brand} {model}"),
            (Some(brand), None) => brand,
            (None, Some(model)) => model,
            (None, None) => ANDROID_FALLBACK_NAME.to_string(),
        }
    }

    async fn ask_manually(&self) -> DeviceResult<DeviceName> {
        for attempt in 1..=MAX_PROMPT_ATTEMPTS {
            let answer = self.prompt.ask(MANUAL_ENTRY_MESSAGE).await?;
            if let Some(name) = DeviceName::parse(&answer) {
                return Ok(name);
            }
            warn!(
                "Rejected manual device name {:?} (attempt {}/{})",
                answer.trim(),
                attempt,
                MAX_PROMPT_ATTEMPTS
            );
        }
        Err(DeviceError::InvalidName(MAX_PROMPT_ATTEMPTS))
    }
}

impl std::fmt::Debug for DeviceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceResolver")
            .field("cache", &self.cache)
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}
