//! Soundboard service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (asset fetcher,
//! audio device) and the user's settings into the playback engine. Desktop
//! apps typically enable the `desktop-shims` feature, which supplies a
//! filesystem fetcher and a headless device (or real output with
//! `cpal-output`).

pub mod content;
pub mod error;
pub mod soundboard;

pub use content::{parse_catalog, sound_paths, SoundItem};
pub use error::{Result, ServiceError};
pub use soundboard::Soundboard;

pub use core_playback::{AudioEngine, PlayOutcome, PreloadSummary, DEFAULT_CHANNEL};
pub use core_runtime::config::EngineConfig;
pub use core_runtime::events::{EventBus, EventStream, SoundEvent};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::settings::{PlaybackMode, SettingsFile, UserSettings};

use std::sync::Arc;
use tracing::info;

/// Build a soundboard from an explicit engine configuration.
pub fn bootstrap(config: EngineConfig, settings: UserSettings) -> Soundboard {
    let engine = Arc::new(AudioEngine::new(config));
    info!(mode = ?settings.playback_mode, "Soundboard ready");
    Soundboard::new(engine, settings)
}

/// Convenience bootstrapper for desktop hosts.
///
/// Assets are read from `asset_root`; settings are loaded from
/// `settings_file`, or the platform default location when `None`. A missing
/// settings file yields the defaults.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, init_logging, LoggingConfig};
///
/// init_logging(LoggingConfig::default())?;
/// let board = bootstrap_desktop("assets", None)?;
/// board.unlock_audio().await;
/// board.press("left", "sounds/lion.wav").await;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    asset_root: impl Into<std::path::PathBuf>,
    settings_file: Option<SettingsFile>,
) -> Result<Soundboard> {
    let settings_file = settings_file.unwrap_or_else(SettingsFile::default_location);
    let settings = settings_file.load()?;

    let config = EngineConfig::builder()
        .asset_root(asset_root)
        .event_bus(EventBus::default())
        .build()?;

    Ok(bootstrap(config, settings))
}
