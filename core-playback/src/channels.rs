//! # Channel Multiplexer
//!
//! Tracks at most one [`PlaybackUnit`] per named channel.
//!
//! Every `begin` or `stop` on a channel bumps its generation. A play request
//! captures the generation in a [`PlayTicket`] before awaiting anything, and
//! only installs its unit if the generation is unchanged when it commits.
//! This makes the last request on a channel win even when loads finish out
//! of order.

use crate::error::Result;
use crate::unit::PlaybackUnit;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Claim on a channel taken at the start of a play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayTicket {
    channel: String,
    generation: u64,
}

impl PlayTicket {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of [`ChannelMultiplexer::commit`].
#[derive(Debug)]
pub enum Commit {
    /// The unit was started and is now the channel's active playback.
    Installed(Duration),
    /// A newer request or a stop claimed the channel first.
    Superseded,
}

/// A unit taken off a channel by a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedUnit {
    pub path: String,
    /// Position the unit had reached
    pub offset: Duration,
}

#[derive(Default)]
struct ChannelSlot {
    generation: u64,
    unit: Option<PlaybackUnit>,
}

impl ChannelSlot {
    fn advance(&mut self) -> Option<StoppedUnit> {
        self.generation = self.generation.wrapping_add(1);
        self.unit.take().map(|unit| {
            let path = unit.path().to_string();
            StoppedUnit {
                path,
                offset: unit.stop(),
            }
        })
    }
}

#[derive(Default)]
pub struct ChannelMultiplexer {
    slots: Mutex<HashMap<String, ChannelSlot>>,
}

impl ChannelMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop whatever the channel is playing and claim it for a new request.
    pub fn begin(&self, channel: &str) -> PlayTicket {
        let mut slots = self.slots.lock();
        let slot = slots.entry(channel.to_string()).or_default();
        slot.advance();
        PlayTicket {
            channel: channel.to_string(),
            generation: slot.generation,
        }
    }

    /// Whether `ticket` still holds the channel.
    pub fn is_current(&self, ticket: &PlayTicket) -> bool {
        self.slots
            .lock()
            .get(&ticket.channel)
            .map(|slot| slot.generation == ticket.generation)
            .unwrap_or(false)
    }

    /// Start a unit with `start` and install it, if `ticket` still holds the
    /// channel. `start` runs under the channel lock and is not called for a
    /// superseded ticket.
    pub fn commit<F>(&self, ticket: &PlayTicket, start: F) -> Result<Commit>
    where
        F: FnOnce() -> Result<PlaybackUnit>,
    {
        let mut slots = self.slots.lock();
        let slot = match slots.get_mut(&ticket.channel) {
            Some(slot) if slot.generation == ticket.generation => slot,
            _ => return Ok(Commit::Superseded),
        };

        let unit = start()?;
        let offset = unit.position();
        if let Some(previous) = slot.unit.replace(unit) {
            previous.stop();
        }
        Ok(Commit::Installed(offset))
    }

    /// Stop the channel, returning the path and position it had reached if
    /// it was playing. Also cancels any request still in flight on the
    /// channel.
    pub fn stop(&self, channel: &str) -> Option<StoppedUnit> {
        let mut slots = self.slots.lock();
        slots.get_mut(channel).and_then(ChannelSlot::advance)
    }

    /// Stop every channel, returning how many were playing.
    pub fn stop_all(&self) -> usize {
        let mut slots = self.slots.lock();
        slots
            .values_mut()
            .filter_map(ChannelSlot::advance)
            .count()
    }

    pub fn is_playing(&self, channel: &str) -> bool {
        self.slots
            .lock()
            .get(channel)
            .map(|slot| slot.unit.is_some())
            .unwrap_or(false)
    }

    /// Current position on a playing channel.
    pub fn position(&self, channel: &str) -> Option<Duration> {
        self.slots
            .lock()
            .get(channel)
            .and_then(|slot| slot.unit.as_ref())
            .map(PlaybackUnit::position)
    }

    /// Path playing on the channel, if any.
    pub fn current_path(&self, channel: &str) -> Option<String> {
        self.slots
            .lock()
            .get(channel)
            .and_then(|slot| slot.unit.as_ref())
            .map(|unit| unit.path().to_string())
    }

    /// Names of channels that are playing, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.unit.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        channels.sort();
        channels
    }
}

impl std::fmt::Debug for ChannelMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMultiplexer")
            .field("active", &self.active_channels())
            .finish()
    }
}
