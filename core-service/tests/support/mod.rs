#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    AssetFetcher, AudioDevice, BridgeError, DecodedBuffer, DeviceState, VoiceId, VoiceRequest,
    VoiceStop,
};
use bytes::Bytes;
use core_playback::{AudioEngine, BufferDecoder};
use core_service::{EngineConfig, Soundboard, UserSettings};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Running device whose clock only moves through `advance`.
#[derive(Default)]
pub struct ManualDevice {
    now: Mutex<Duration>,
    voices: Mutex<HashSet<VoiceId>>,
}

impl ManualDevice {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn live_voices(&self) -> usize {
        self.voices.lock().len()
    }
}

#[async_trait]
impl AudioDevice for ManualDevice {
    fn state(&self) -> DeviceState {
        DeviceState::Running
    }

    async fn resume(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn current_time(&self) -> Duration {
        *self.now.lock()
    }

    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn start_voice(&self, _request: VoiceRequest) -> Result<VoiceId, BridgeError> {
        let id = VoiceId::new();
        self.voices.lock().insert(id);
        Ok(id)
    }

    fn stop_voice(&self, voice: VoiceId) -> Result<VoiceStop, BridgeError> {
        if self.voices.lock().remove(&voice) {
            Ok(VoiceStop::Stopped)
        } else {
            Ok(VoiceStop::AlreadyStopped)
        }
    }
}

/// Serves one-second clips for every registered path.
#[derive(Default)]
pub struct ClipFetcher {
    clips: Mutex<HashMap<String, usize>>,
}

impl ClipFetcher {
    pub fn with_clips(clips: &[(&str, usize)]) -> Arc<Self> {
        let fetcher = Self::default();
        for (path, millis) in clips {
            fetcher.clips.lock().insert(path.to_string(), *millis);
        }
        Arc::new(fetcher)
    }
}

#[async_trait]
impl AssetFetcher for ClipFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes, BridgeError> {
        self.clips
            .lock()
            .get(path)
            .map(|millis| Bytes::from(vec![0u8; *millis]))
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }
}

/// One mono frame per byte at 1 kHz.
pub struct ByteDecoder;

impl BufferDecoder for ByteDecoder {
    fn decode(&self, _path: &str, bytes: &[u8]) -> core_playback::Result<DecodedBuffer> {
        Ok(DecodedBuffer::new(vec![0.1; bytes.len()], 1, 1000)?)
    }
}

pub fn board(settings: UserSettings) -> (Soundboard, Arc<ManualDevice>) {
    let device = Arc::new(ManualDevice::default());
    let fetcher = ClipFetcher::with_clips(&[
        ("sounds/lion.wav", 2000),
        ("sounds/dog.wav", 2000),
        ("sounds/cat.wav", 2000),
    ]);

    let config = EngineConfig::builder()
        .asset_fetcher(fetcher)
        .device(device.clone())
        .build()
        .expect("complete config");
    let engine = Arc::new(AudioEngine::with_decoder(config, Arc::new(ByteDecoder)));

    (Soundboard::new(engine, settings), device)
}

pub fn settings_with(mode: core_service::PlaybackMode, max_time_ms: Option<u64>) -> UserSettings {
    UserSettings {
        playback_mode: mode,
        max_time_ms,
        ..UserSettings::default()
    }
}

pub fn assert_close(actual: Duration, expected: Duration) {
    let diff = (actual.as_secs_f64() - expected.as_secs_f64()).abs();
    assert!(diff < 0.001, "expected {:?}, got {:?}", expected, actual);
}
