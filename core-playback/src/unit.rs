//! A single live, looping playback of one decoded buffer.

use crate::error::Result;
use bridge_traits::{AudioDevice, BridgeError, DecodedBuffer, VoiceId, VoiceRequest, VoiceStop};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Reduce `offset` into `[0, duration)` with a Euclidean remainder.
///
/// Zero-length buffers always normalize to zero.
pub fn normalize_offset(offset: Duration, duration: Duration) -> Duration {
    normalize_secs(offset.as_secs_f64(), duration.as_secs_f64())
}

fn normalize_secs(offset: f64, duration: f64) -> Duration {
    if duration <= 0.0 || !offset.is_finite() {
        return Duration::ZERO;
    }
    let position = offset.rem_euclid(duration);
    // rem_euclid can round up to exactly `duration` for tiny negative inputs.
    if position >= duration {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(position)
    }
}

/// One voice on the device plus the clock anchor needed to recover its
/// position later.
///
/// The anchor is the device time at which buffer position zero would have
/// played, so the live position is `(now - anchor) mod duration`.
pub struct PlaybackUnit {
    voice: VoiceId,
    path: String,
    buffer: Arc<DecodedBuffer>,
    anchor: f64,
    device: Arc<dyn AudioDevice>,
}

impl PlaybackUnit {
    /// Start looping `buffer` at `offset` (normalized into the buffer).
    pub fn start(
        device: Arc<dyn AudioDevice>,
        path: &str,
        buffer: Arc<DecodedBuffer>,
        offset: Duration,
    ) -> Result<Self> {
        let offset = normalize_offset(offset, buffer.duration());
        let voice = device.start_voice(VoiceRequest::new_looping(Arc::clone(&buffer), offset))?;
        let anchor = device.current_time().as_secs_f64() - offset.as_secs_f64();

        debug!(
            file = %strip_path(path),
            voice = %voice,
            offset_ms = offset.as_millis() as u64,
            "Voice started"
        );

        Ok(Self {
            voice,
            path: path.to_string(),
            buffer,
            anchor,
            device,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    pub fn buffer(&self) -> &Arc<DecodedBuffer> {
        &self.buffer
    }

    /// Current position inside the buffer.
    pub fn position(&self) -> Duration {
        let elapsed = self.device.current_time().as_secs_f64() - self.anchor;
        normalize_secs(elapsed, self.buffer.duration_secs())
    }

    /// Stop the voice and return the position it had reached.
    pub fn stop(self) -> Duration {
        let position = self.position();
        match self.device.stop_voice(self.voice) {
            Ok(VoiceStop::Stopped) => {
                debug!(
                    file = %strip_path(&self.path),
                    voice = %self.voice,
                    offset_ms = position.as_millis() as u64,
                    "Voice stopped"
                );
            }
            Ok(VoiceStop::AlreadyStopped) => {}
            Err(BridgeError::NotFound(_)) => {}
            Err(e) => {
                warn!(voice = %self.voice, error = %e, "Failed to stop voice");
            }
        }
        position
    }
}

impl std::fmt::Debug for PlaybackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackUnit")
            .field("voice", &self.voice)
            .field("path", &self.path)
            .field("anchor", &self.anchor)
            .finish()
    }
}
