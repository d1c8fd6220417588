//! Headless Audio Device
//!
//! An [`AudioDevice`] that produces no sound. The device clock follows the
//! wall clock while running and stands still while suspended, matching how
//! hardware-backed devices report time.

use async_trait::async_trait;
use bridge_traits::{
    audio::{AudioDevice, DeviceState, VoiceId, VoiceRequest, VoiceStop},
    error::{BridgeError, Result},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;

struct HeadlessState {
    state: DeviceState,
    /// Clock time accumulated during previous running periods
    accumulated: Duration,
    running_since: Option<Instant>,
    resume_allowed: bool,
    voices: HashMap<VoiceId, VoiceRequest>,
}

/// Audio device without real output
pub struct HeadlessAudioDevice {
    sample_rate: u32,
    inner: Mutex<HeadlessState>,
}

impl HeadlessAudioDevice {
    /// Create a running device
    pub fn new() -> Self {
        Self::with_state(DeviceState::Running)
    }

    /// Create a device that starts suspended and must be resumed first
    pub fn suspended() -> Self {
        Self::with_state(DeviceState::Suspended)
    }

    fn with_state(state: DeviceState) -> Self {
        let running_since = match state {
            DeviceState::Running => Some(Instant::now()),
            DeviceState::Suspended => None,
        };

        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            inner: Mutex::new(HeadlessState {
                state,
                accumulated: Duration::ZERO,
                running_since,
                resume_allowed: true,
                voices: HashMap::new(),
            }),
        }
    }

    /// Allow or refuse future `resume` calls
    pub fn set_resume_allowed(&self, allowed: bool) {
        self.inner.lock().resume_allowed = allowed;
    }

    /// Move a running device back to `Suspended`, freezing its clock
    pub fn suspend(&self) {
        let mut inner = self.inner.lock();
        if let Some(since) = inner.running_since.take() {
            inner.accumulated += since.elapsed();
        }
        inner.state = DeviceState::Suspended;
    }

    /// Number of voices currently live
    pub fn active_voices(&self) -> usize {
        self.inner.lock().voices.len()
    }
}

impl Default for HeadlessAudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioDevice for HeadlessAudioDevice {
    fn state(&self) -> DeviceState {
        self.inner.lock().state
    }

    async fn resume(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == DeviceState::Running {
            return Ok(());
        }
        if !inner.resume_allowed {
            return Err(BridgeError::Denied(
                "resume refused by headless device".to_string(),
            ));
        }

        inner.state = DeviceState::Running;
        inner.running_since = Some(Instant::now());
        debug!("Headless device resumed");
        Ok(())
    }

    fn current_time(&self) -> Duration {
        let inner = self.inner.lock();
        match inner.running_since {
            Some(since) => inner.accumulated + since.elapsed(),
            None => inner.accumulated,
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start_voice(&self, request: VoiceRequest) -> Result<VoiceId> {
        let id = VoiceId::new();
        debug!(
            voice = %id,
            offset_ms = request.offset.as_millis() as u64,
            frames = request.buffer.frames(),
            "Starting headless voice"
        );
        self.inner.lock().voices.insert(id, request);
        Ok(id)
    }

    fn stop_voice(&self, voice: VoiceId) -> Result<VoiceStop> {
        match self.inner.lock().voices.remove(&voice) {
            Some(_) => Ok(VoiceStop::Stopped),
            None => Ok(VoiceStop::AlreadyStopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::audio::DecodedBuffer;
    use std::sync::Arc;

    fn buffer() -> Arc<DecodedBuffer> {
        Arc::new(DecodedBuffer::new(vec![0.0; 4410], 1, 44100).unwrap())
    }

    #[tokio::test]
    async fn test_suspended_clock_stands_still() {
        let device = HeadlessAudioDevice::suspended();
        assert_eq!(device.state(), DeviceState::Suspended);
        assert_eq!(device.current_time(), Duration::ZERO);

        device.resume().await.unwrap();
        assert_eq!(device.state(), DeviceState::Running);
    }

    #[tokio::test]
    async fn test_resume_can_be_refused() {
        let device = HeadlessAudioDevice::suspended();
        device.set_resume_allowed(false);

        let err = device.resume().await.unwrap_err();
        assert!(matches!(err, BridgeError::Denied(_)));
        assert_eq!(device.state(), DeviceState::Suspended);
    }

    #[test]
    fn test_voice_lifecycle() {
        let device = HeadlessAudioDevice::new();
        let id = device
            .start_voice(VoiceRequest::new_looping(buffer(), Duration::ZERO))
            .unwrap();
        assert_eq!(device.active_voices(), 1);

        assert_eq!(device.stop_voice(id).unwrap(), VoiceStop::Stopped);
        assert_eq!(device.stop_voice(id).unwrap(), VoiceStop::AlreadyStopped);
        assert_eq!(device.active_voices(), 0);
    }

    #[test]
    fn test_suspend_freezes_clock() {
        let device = HeadlessAudioDevice::new();
        std::thread::sleep(Duration::from_millis(5));
        device.suspend();

        let frozen = device.current_time();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(device.current_time(), frozen);
        assert!(frozen >= Duration::from_millis(5));
    }
}
