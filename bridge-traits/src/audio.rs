//! Audio device bridge and the decoded-buffer types it consumes.
//!
//! The core never touches the realtime audio thread. It only asks the host
//! device to start or stop *voices* (one live instance of a decoded buffer)
//! and reads the device clock to anchor playback positions. Host platforms
//! supply an [`AudioDevice`] that owns the output stream and mixes whatever
//! voices are live.

use crate::error::{BridgeError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Immutable decoded PCM audio held in memory.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]` (LRLR... for stereo). A
/// buffer is never mutated after construction and is shared read-only by any
/// number of voices through an `Arc`.
#[derive(Clone, PartialEq)]
pub struct DecodedBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    frames: usize,
}

impl DecodedBuffer {
    /// Build a buffer from interleaved samples.
    ///
    /// Fails when the layout is inconsistent: zero channels, zero sample rate,
    /// or a sample count that is not a multiple of the channel count.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(BridgeError::InvalidData("channel count is zero".to_string()));
        }
        if sample_rate == 0 {
            return Err(BridgeError::InvalidData("sample rate is zero".to_string()));
        }
        if samples.len() % channels as usize != 0 {
            return Err(BridgeError::InvalidData(format!(
                "{} samples cannot be split into {} channels",
                samples.len(),
                channels
            )));
        }

        let frames = samples.len() / channels as usize;
        Ok(Self {
            samples,
            channels,
            sample_rate,
            frames,
        })
    }

    /// Interleaved sample data.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Returns `true` if the buffer holds no audio.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Playback length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Samples of the frame at `index`, one per channel.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.frames()`.
    pub fn frame(&self, index: usize) -> &[f32] {
        let channels = self.channels as usize;
        let start = index * channels;
        &self.samples[start..start + channels]
    }
}

impl fmt::Debug for DecodedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedBuffer")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames)
            .finish()
    }
}

/// Whether the device is currently allowed to produce sound.
///
/// Platforms may start a device suspended until a user gesture resumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    Suspended,
    Running,
}

/// Identifier for a voice started on an [`AudioDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(Uuid);

impl VoiceId {
    /// Generate a new voice identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request to start one voice.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    /// Buffer to play. Shared, never copied by the device.
    pub buffer: Arc<DecodedBuffer>,
    /// Position inside the buffer at which output begins, `< buffer.duration()`.
    pub offset: Duration,
    /// Restart from the beginning when the end is reached.
    pub looping: bool,
}

impl VoiceRequest {
    pub fn new_looping(buffer: Arc<DecodedBuffer>, offset: Duration) -> Self {
        Self {
            buffer,
            offset,
            looping: true,
        }
    }
}

/// Outcome of stopping a voice. Stopping twice is a normal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStop {
    Stopped,
    AlreadyStopped,
}

/// Output device and mixing graph provided by the host platform.
///
/// Exactly one device exists per process. Implementations must be cheap to
/// query: `state`, `current_time`, `start_voice` and `stop_voice` are called on
/// the control path and must not block on audio I/O.
#[async_trait::async_trait]
pub trait AudioDevice: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> DeviceState;

    /// Transition from `Suspended` to `Running`.
    ///
    /// Returns [`BridgeError::Denied`] when the platform refuses (for example
    /// outside of a user gesture). No-op when already running.
    async fn resume(&self) -> Result<()>;

    /// Monotonic device clock, measured from device creation.
    fn current_time(&self) -> Duration;

    /// Output sample rate of the device in hertz.
    fn sample_rate(&self) -> u32;

    /// Start feeding a voice to the output.
    fn start_voice(&self, request: VoiceRequest) -> Result<VoiceId>;

    /// Halt and disconnect a voice.
    fn stop_voice(&self, voice: VoiceId) -> Result<VoiceStop>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_buffer_layout() {
        let buffer = DecodedBuffer::new(vec![0.0; 8820], 2, 44100).unwrap();
        assert_eq!(buffer.frames(), 4410);
        assert_eq!(buffer.duration().as_millis(), 100);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.frame(1).len(), 2);
    }

    #[test]
    fn decoded_buffer_rejects_bad_layout() {
        assert!(DecodedBuffer::new(vec![0.0; 3], 2, 44100).is_err());
        assert!(DecodedBuffer::new(vec![0.0; 4], 0, 44100).is_err());
        assert!(DecodedBuffer::new(vec![0.0; 4], 2, 0).is_err());
    }

    #[test]
    fn empty_buffer_has_zero_duration() {
        let buffer = DecodedBuffer::new(Vec::new(), 1, 8000).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn voice_ids_are_unique() {
        let a = VoiceId::new();
        let b = VoiceId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_uuid().to_string());
    }
}
