//! # Engine Configuration Module
//!
//! Provides configuration management for the soundboard audio engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `EngineConfig` holding the platform bridges and tuning knobs the engine
//! needs. It enforces fail-fast validation so a missing bridge is reported at
//! startup instead of on the first key press.
//!
//! ## Required Dependencies
//!
//! - `AssetFetcher` - Raw bytes behind a logical asset path
//! - `DeviceFactory` - Creates the audio output device on first use
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults are
//! injected automatically if not provided: a `TokioAssetFetcher` rooted at
//! `asset_root`, and a headless device (or the system output device with
//! `cpal-output`).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::builder()
//!     .asset_fetcher(Arc::new(MyFetcher))
//!     .device_factory(Arc::new(|| Ok(Arc::new(MyDevice::new()) as _)))
//!     .max_concurrent_loads(4)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//!
//! // Without desktop-shims this fails with Error::CapabilityMissing
//! let result = EngineConfig::builder().build();
//! ```

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{AssetFetcher, AudioDevice};
use std::path::PathBuf;
use std::sync::Arc;

/// Default bound on simultaneous fetch+decode operations.
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 8;

/// Upper bound accepted for `max_concurrent_loads`.
pub const MAX_CONCURRENT_LOADS_LIMIT: usize = 64;

/// Creates the process-wide audio device. Invoked lazily, at most once per
/// successful creation.
pub type DeviceFactory =
    Arc<dyn Fn() -> bridge_traits::error::Result<Arc<dyn AudioDevice>> + Send + Sync>;

/// Engine configuration.
///
/// Use [`EngineConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Source of raw asset bytes
    pub asset_fetcher: Arc<dyn AssetFetcher>,

    /// Lazily creates the audio device
    pub device_factory: DeviceFactory,

    /// Local asset directory used by the desktop fetcher
    pub asset_root: Option<PathBuf>,

    /// Maximum number of assets fetched and decoded at the same time
    pub max_concurrent_loads: usize,

    /// Optional bus receiving engine events
    pub event_bus: Option<EventBus>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("asset_fetcher", &"AssetFetcher { ... }")
            .field("device_factory", &"DeviceFactory { ... }")
            .field("asset_root", &self.asset_root)
            .field("max_concurrent_loads", &self.max_concurrent_loads)
            .field("event_bus", &self.event_bus)
            .finish()
    }
}

impl EngineConfig {
    /// Creates a new builder for constructing an `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_loads == 0 {
            return Err(Error::Config(
                "max_concurrent_loads must be at least 1".to_string(),
            ));
        }

        if self.max_concurrent_loads > MAX_CONCURRENT_LOADS_LIMIT {
            return Err(Error::Config(format!(
                "max_concurrent_loads exceeds maximum of {}",
                MAX_CONCURRENT_LOADS_LIMIT
            )));
        }

        if let Some(root) = &self.asset_root {
            if root.as_os_str().is_empty() {
                return Err(Error::Config("Asset root cannot be empty".to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_asset_fetcher(_asset_root: Option<&PathBuf>) -> Result<Arc<dyn AssetFetcher>> {
    Err(Error::CapabilityMissing {
        capability: "AssetFetcher".to_string(),
        message: "AssetFetcher implementation is required to load sounds. \
                 Desktop: enable the 'desktop-shims' feature to use TokioAssetFetcher. \
                 Web: inject a fetch-based implementation."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_asset_fetcher(asset_root: Option<&PathBuf>) -> Result<Arc<dyn AssetFetcher>> {
    use bridge_desktop::TokioAssetFetcher;

    let fetcher = match asset_root {
        Some(root) => TokioAssetFetcher::new(root.clone()),
        None => TokioAssetFetcher::with_default_root(),
    };
    Ok(Arc::new(fetcher))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_device_factory() -> Result<DeviceFactory> {
    Err(Error::CapabilityMissing {
        capability: "AudioDevice".to_string(),
        message: "A device factory is required to produce sound. \
                 Desktop: enable the 'desktop-shims' or 'cpal-output' feature. \
                 Web: inject an AudioContext-backed device."
            .to_string(),
    })
}

#[cfg(all(feature = "desktop-shims", not(feature = "cpal-output")))]
fn provide_default_device_factory() -> Result<DeviceFactory> {
    use bridge_desktop::HeadlessAudioDevice;

    let factory: DeviceFactory = Arc::new(|| {
        let device: Arc<dyn AudioDevice> = Arc::new(HeadlessAudioDevice::new());
        Ok(device)
    });
    Ok(factory)
}

#[cfg(feature = "cpal-output")]
fn provide_default_device_factory() -> Result<DeviceFactory> {
    use bridge_desktop::CpalAudioDevice;

    let factory: DeviceFactory = Arc::new(|| {
        let device: Arc<dyn AudioDevice> = Arc::new(CpalAudioDevice::open()?);
        Ok(device)
    });
    Ok(factory)
}

/// Builder for constructing [`EngineConfig`] instances.
#[derive(Default)]
pub struct EngineConfigBuilder {
    asset_fetcher: Option<Arc<dyn AssetFetcher>>,
    device_factory: Option<DeviceFactory>,
    asset_root: Option<PathBuf>,
    max_concurrent_loads: Option<usize>,
    event_bus: Option<EventBus>,
}

impl EngineConfigBuilder {
    /// Sets the asset fetcher.
    pub fn asset_fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.asset_fetcher = Some(fetcher);
        self
    }

    /// Sets the factory creating the audio device on first use.
    pub fn device_factory(mut self, factory: DeviceFactory) -> Self {
        self.device_factory = Some(factory);
        self
    }

    /// Uses an already created device.
    pub fn device(self, device: Arc<dyn AudioDevice>) -> Self {
        self.device_factory(Arc::new(move || Ok(Arc::clone(&device))))
    }

    /// Sets the local asset directory for the default desktop fetcher.
    pub fn asset_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Sets the bound on simultaneous fetch+decode operations (1..=64).
    pub fn max_concurrent_loads(mut self, limit: usize) -> Self {
        self.max_concurrent_loads = Some(limit);
        self
    }

    /// Attaches an event bus.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Builds the final `EngineConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   platform default is compiled in
    /// - [`Error::Config`] when a value is out of range
    pub fn build(self) -> Result<EngineConfig> {
        let asset_fetcher = match self.asset_fetcher {
            Some(fetcher) => fetcher,
            None => provide_default_asset_fetcher(self.asset_root.as_ref())?,
        };

        let device_factory = match self.device_factory {
            Some(factory) => factory,
            None => provide_default_device_factory()?,
        };

        let config = EngineConfig {
            asset_fetcher,
            device_factory,
            asset_root: self.asset_root,
            max_concurrent_loads: self
                .max_concurrent_loads
                .unwrap_or(DEFAULT_MAX_CONCURRENT_LOADS),
            event_bus: self.event_bus,
        };

        config.validate()?;

        Ok(config)
    }
}
