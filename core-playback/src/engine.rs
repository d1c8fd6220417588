//! # Audio Engine
//!
//! The public facade over device lifecycle, buffer cache and channels.
//!
//! ## Overview
//!
//! One `AudioEngine` is constructed per process from an [`EngineConfig`] and
//! shared by reference (or `Arc`). It owns all mutable playback state; callers
//! only reach it through the operations below, none of which return errors.
//! Every failure is logged and degrades to "no sound played".
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{AudioEngine, PlayOutcome};
//! use core_runtime::config::EngineConfig;
//! use std::time::Duration;
//!
//! let engine = AudioEngine::new(EngineConfig::builder().build()?);
//! engine.resume_device().await;
//! engine.preload(["sounds/cat.wav", "sounds/dog.wav"]).await;
//!
//! engine.play("sounds/cat.wav", "left", Duration::ZERO).await;
//! let offset = engine.stop("left");
//! engine.play("sounds/cat.wav", "left", offset).await; // resumes
//! ```

use crate::cache::{BufferCache, PreloadSummary};
use crate::channels::{ChannelMultiplexer, Commit, StoppedUnit};
use crate::context::DeviceContext;
use crate::decoder::{BufferDecoder, SymphoniaDecoder};
use crate::unit::PlaybackUnit;
use bridge_traits::{DecodedBuffer, DeviceState};
use core_runtime::config::EngineConfig;
use core_runtime::events::{EventBus, SoundEvent};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Channel id used by the single-channel operations.
pub const DEFAULT_CHANNEL: &str = "default";

/// What a [`AudioEngine::play`] call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// A looping unit is live on the channel, starting at `offset`.
    Started { offset: Duration },
    /// The path was empty; nothing changed.
    Skipped,
    /// The device or the sound could not be made ready; the channel is idle.
    Unavailable,
    /// A later `play` or `stop` on the channel took over while this one was
    /// still resolving.
    Superseded,
}

impl PlayOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }
}

pub struct AudioEngine {
    context: DeviceContext,
    cache: BufferCache,
    channels: ChannelMultiplexer,
    events: Option<EventBus>,
}

impl AudioEngine {
    /// Engine decoding with symphonia.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_decoder(config, Arc::new(SymphoniaDecoder::new()))
    }

    /// Engine with a custom decoder.
    pub fn with_decoder(config: EngineConfig, decoder: Arc<dyn BufferDecoder>) -> Self {
        debug!(?config, "Creating audio engine");
        let events = config.event_bus.clone();
        Self {
            context: DeviceContext::new(config.device_factory, events.clone()),
            cache: BufferCache::new(
                config.asset_fetcher,
                decoder,
                config.max_concurrent_loads,
                events.clone(),
            ),
            channels: ChannelMultiplexer::new(),
            events,
        }
    }

    // ========================================================================
    // Device
    // ========================================================================

    /// Resume the output device if it is suspended.
    ///
    /// Call this from a user-interaction handler on platforms that gate audio
    /// behind a gesture. A denial leaves the device suspended; the next call
    /// retries.
    pub async fn resume_device(&self) -> DeviceState {
        self.context.resume().await
    }

    /// Device state, or `None` before the device has been created.
    pub fn device_state(&self) -> Option<DeviceState> {
        self.context.state()
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Fetch and decode every path not already cached.
    ///
    /// Completes once all loads have settled. Individual failures are logged
    /// and counted, never propagated.
    pub async fn preload<I, S>(&self, paths: I) -> PreloadSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache.preload(paths).await
    }

    /// Decoded buffer for `path`, loading it on a cache miss.
    pub async fn resolve(&self, path: &str) -> Option<Arc<DecodedBuffer>> {
        self.cache.resolve(path).await
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains(path)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Play `path` looping on `channel`, starting at `offset`.
    ///
    /// Whatever the channel was playing is stopped first. `offset` past the
    /// end of the sound wraps around. An empty `path` is a no-op.
    #[instrument(skip(self), fields(offset_ms = offset.as_millis() as u64))]
    pub async fn play(&self, path: &str, channel: &str, offset: Duration) -> PlayOutcome {
        if path.trim().is_empty() {
            return PlayOutcome::Skipped;
        }

        let ticket = self.channels.begin(channel);

        let device = match self.context.ensure_running().await {
            Ok(device) => device,
            Err(e) => {
                warn!(channel, error = %e, "Cannot play without a running device");
                return PlayOutcome::Unavailable;
            }
        };

        let buffer = self.cache.resolve(path).await;

        if !self.channels.is_current(&ticket) {
            return self.superseded(channel, path, ticket.generation());
        }

        let Some(buffer) = buffer else {
            return PlayOutcome::Unavailable;
        };

        let committed = self.channels.commit(&ticket, || {
            PlaybackUnit::start(device, path, buffer, offset)
        });

        match committed {
            Ok(Commit::Installed(offset)) => {
                info!(
                    channel,
                    file = %strip_path(path),
                    offset_ms = offset.as_millis() as u64,
                    "Playback started"
                );
                self.emit(SoundEvent::Started {
                    channel: channel.to_string(),
                    path: path.to_string(),
                    offset_ms: offset.as_millis() as u64,
                });
                PlayOutcome::Started { offset }
            }
            Ok(Commit::Superseded) => self.superseded(channel, path, ticket.generation()),
            Err(e) => {
                warn!(channel, file = %strip_path(path), error = %e, "Failed to start playback");
                PlayOutcome::Unavailable
            }
        }
    }

    /// Stop `channel`, returning the position reached so a later `play` with
    /// that offset resumes at the same point. Returns zero if idle.
    pub fn stop(&self, channel: &str) -> Duration {
        self.stop_unit(channel)
            .map(|stopped| stopped.offset)
            .unwrap_or(Duration::ZERO)
    }

    /// Like [`stop`](Self::stop), also reporting which path was playing.
    /// Returns `None` if the channel was idle.
    pub fn stop_unit(&self, channel: &str) -> Option<StoppedUnit> {
        let stopped = self.channels.stop(channel)?;
        let offset_ms = stopped.offset.as_millis() as u64;
        info!(channel, file = %strip_path(&stopped.path), offset_ms, "Playback stopped");
        self.emit(SoundEvent::Stopped {
            channel: channel.to_string(),
            offset_ms,
        });
        Some(stopped)
    }

    /// Stop every playing channel. Returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let stopped = self.channels.stop_all();
        if stopped > 0 {
            info!(stopped, "Stopped all channels");
        }
        stopped
    }

    /// [`play`](Self::play) on [`DEFAULT_CHANNEL`] from the beginning.
    pub async fn play_default(&self, path: &str) -> PlayOutcome {
        self.play(path, DEFAULT_CHANNEL, Duration::ZERO).await
    }

    /// [`stop`](Self::stop) on [`DEFAULT_CHANNEL`].
    pub fn stop_default(&self) -> Duration {
        self.stop(DEFAULT_CHANNEL)
    }

    pub fn is_playing(&self, channel: &str) -> bool {
        self.channels.is_playing(channel)
    }

    /// Live position on `channel`, if it is playing.
    pub fn position(&self, channel: &str) -> Option<Duration> {
        self.channels.position(channel)
    }

    /// Path playing on `channel`, if any.
    pub fn current_path(&self, channel: &str) -> Option<String> {
        self.channels.current_path(channel)
    }

    /// Names of playing channels, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        self.channels.active_channels()
    }

    /// Event bus passed in through the config, if any.
    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    fn superseded(&self, channel: &str, path: &str, generation: u64) -> PlayOutcome {
        debug!(channel, generation, file = %strip_path(path), "Discarding superseded play");
        self.emit(SoundEvent::Superseded {
            channel: channel.to_string(),
            path: path.to_string(),
        });
        PlayOutcome::Superseded
    }

    fn emit(&self, event: SoundEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(event);
        }
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEngine")
            .field("context", &self.context)
            .field("cache", &self.cache)
            .field("channels", &self.channels)
            .finish()
    }
}
