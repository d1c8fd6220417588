//! # Soundboard
//!
//! Press/release policy on top of the [`AudioEngine`].
//!
//! The engine only knows `play(path, channel, offset)` and `stop(channel)`.
//! This layer decides which offset a press starts from, according to the
//! user's [`PlaybackMode`], and enforces the `maxTimeMs` cap.
//!
//! ## Playback modes
//!
//! - `Restart` and `Autoplay`: every press plays from the beginning.
//! - `Resume`: a press continues from where the last release of the same
//!   sound on the same channel stopped.
//!
//! ## Duration cap
//!
//! After a successful press a timer releases the channel once the cap
//! elapses, unless another press or release on that channel happened first.
//! Each press takes a fresh token; the timer only fires for its own token.

use crate::content::{sound_paths, SoundItem};
use core_playback::{AudioEngine, PlayOutcome, PreloadSummary, StoppedUnit};
use core_runtime::logging::strip_path;
use core_runtime::settings::{PlaybackMode, UserSettings};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Default)]
struct BoardState {
    /// Live press token per channel
    presses: HashMap<String, u64>,
    next_token: u64,
    /// Offsets remembered on release, keyed by (channel, path)
    offsets: HashMap<(String, String), Duration>,
}

struct BoardInner {
    engine: Arc<AudioEngine>,
    settings: RwLock<UserSettings>,
    state: Mutex<BoardState>,
}

/// Cloneable handle on a soundboard.
#[derive(Clone)]
pub struct Soundboard {
    inner: Arc<BoardInner>,
}

impl Soundboard {
    pub fn new(engine: Arc<AudioEngine>, settings: UserSettings) -> Self {
        Self {
            inner: Arc::new(BoardInner {
                engine,
                settings: RwLock::new(settings),
                state: Mutex::new(BoardState::default()),
            }),
        }
    }

    pub fn engine(&self) -> &Arc<AudioEngine> {
        &self.inner.engine
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> UserSettings {
        self.inner.settings.read().clone()
    }

    /// Replace the settings. Leaving `Resume` mode forgets remembered offsets.
    pub fn update_settings(&self, settings: UserSettings) {
        if settings.playback_mode != PlaybackMode::Resume {
            self.inner.state.lock().offsets.clear();
        }
        debug!(mode = ?settings.playback_mode, max_time_ms = ?settings.max_time_ms, "Settings updated");
        *self.inner.settings.write() = settings;
    }

    /// Resume the output device. Call from a user-gesture handler.
    pub async fn unlock_audio(&self) -> bridge_traits::DeviceState {
        self.inner.engine.resume_device().await
    }

    /// Preload the sounds of every card that has one.
    pub async fn preload_items(&self, items: &[SoundItem]) -> PreloadSummary {
        self.inner.engine.preload(sound_paths(items)).await
    }

    /// Start `path` on `channel` according to the playback mode.
    #[instrument(skip(self), fields(file = %strip_path(path)))]
    pub async fn press(&self, channel: &str, path: &str) -> PlayOutcome {
        let path = path.trim();
        if path.is_empty() {
            return PlayOutcome::Skipped;
        }

        let settings = self.settings();
        let offset = match settings.playback_mode {
            PlaybackMode::Resume => {
                // Keep the position of whatever the press interrupts.
                self.inner.release(channel);
                self.inner.remembered(channel, path)
            }
            PlaybackMode::Restart | PlaybackMode::Autoplay => Duration::ZERO,
        };

        let token = self.inner.claim(channel);
        let outcome = self.inner.engine.play(path, channel, offset).await;

        if outcome.is_started() {
            if let Some(cap) = settings.max_duration().filter(|cap| !cap.is_zero()) {
                self.schedule_cap(channel, token, cap);
            }
        }

        outcome
    }

    /// [`press`](Self::press) with a card's sound. Cards without a sound
    /// are skipped.
    pub async fn press_item(&self, channel: &str, item: &SoundItem) -> PlayOutcome {
        match item.sound() {
            Some(path) => self.press(channel, path).await,
            None => PlayOutcome::Skipped,
        }
    }

    /// Stop `channel`, remembering its position in `Resume` mode. Returns the
    /// position reached.
    pub fn release(&self, channel: &str) -> Duration {
        self.inner.release(channel)
    }

    /// Release every playing channel. Returns how many were playing.
    pub fn stop_all(&self) -> usize {
        let channels = self.inner.engine.active_channels();
        for channel in &channels {
            self.inner.release(channel);
        }
        self.inner.state.lock().presses.clear();
        // Catches plays still resolving on channels not yet active.
        self.inner.engine.stop_all();
        channels.len()
    }

    /// Offset a `Resume` press of `path` on `channel` would start from.
    pub fn remembered_offset(&self, channel: &str, path: &str) -> Duration {
        self.inner.remembered(channel, path)
    }

    fn schedule_cap(&self, channel: &str, token: u64, cap: Duration) {
        let inner = Arc::clone(&self.inner);
        let channel = channel.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(cap).await;
            if inner.is_current(&channel, token) {
                info!(channel = %channel, cap_ms = cap.as_millis() as u64, "Max play time reached");
                inner.release(&channel);
            }
        });
    }
}

impl BoardInner {
    fn claim(&self, channel: &str) -> u64 {
        let mut state = self.state.lock();
        state.next_token = state.next_token.wrapping_add(1);
        let token = state.next_token;
        state.presses.insert(channel.to_string(), token);
        token
    }

    fn is_current(&self, channel: &str, token: u64) -> bool {
        self.state.lock().presses.get(channel) == Some(&token)
    }

    fn remembered(&self, channel: &str, path: &str) -> Duration {
        self.state
            .lock()
            .offsets
            .get(&(channel.to_string(), path.to_string()))
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    fn release(&self, channel: &str) -> Duration {
        let stopped = self.engine.stop_unit(channel);

        let mut state = self.state.lock();
        state.presses.remove(channel);
        match stopped {
            Some(StoppedUnit { path, offset }) => {
                if self.settings.read().playback_mode == PlaybackMode::Resume {
                    debug!(channel, file = %strip_path(&path), offset_ms = offset.as_millis() as u64, "Remembering position");
                    state.offsets.insert((channel.to_string(), path), offset);
                }
                offset
            }
            None => Duration::ZERO,
        }
    }
}

impl std::fmt::Debug for Soundboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Soundboard")
            .field("engine", &self.inner.engine)
            .field("mode", &self.inner.settings.read().playback_mode)
            .finish()
    }
}
