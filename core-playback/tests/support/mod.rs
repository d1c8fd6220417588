//! Test doubles shared by the engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    AssetFetcher, AudioDevice, BridgeError, DecodedBuffer, DeviceState, VoiceId, VoiceRequest,
    VoiceStop,
};
use bytes::Bytes;
use core_playback::{AudioEngine, BufferDecoder, PlaybackError};
use core_runtime::config::EngineConfig;
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Sample rate used by [`FakeDecoder`]: one sample per millisecond.
pub const FAKE_RATE: u32 = 1000;

// ============================================================================
// Device
// ============================================================================

struct DeviceInner {
    state: DeviceState,
    now: Duration,
    resume_allowed: bool,
    voices: HashMap<VoiceId, VoiceRequest>,
    started: Vec<VoiceRequest>,
}

/// Device with a manually advanced clock that records voices.
pub struct FakeDevice {
    inner: Mutex<DeviceInner>,
}

impl FakeDevice {
    pub fn running() -> Arc<Self> {
        Arc::new(Self::with_state(DeviceState::Running))
    }

    pub fn suspended() -> Arc<Self> {
        Arc::new(Self::with_state(DeviceState::Suspended))
    }

    fn with_state(state: DeviceState) -> Self {
        Self {
            inner: Mutex::new(DeviceInner {
                state,
                now: Duration::from_secs(100),
                resume_allowed: true,
                voices: HashMap::new(),
                started: Vec::new(),
            }),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.inner.lock().now += by;
    }

    pub fn set_resume_allowed(&self, allowed: bool) {
        self.inner.lock().resume_allowed = allowed;
    }

    /// Number of voices currently feeding the output.
    pub fn live_voices(&self) -> usize {
        self.inner.lock().voices.len()
    }

    /// Every voice request ever started, in order.
    pub fn started(&self) -> Vec<VoiceRequest> {
        self.inner.lock().started.clone()
    }
}

#[async_trait]
impl AudioDevice for FakeDevice {
    fn state(&self) -> DeviceState {
        self.inner.lock().state
    }

    async fn resume(&self) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        if !inner.resume_allowed {
            return Err(BridgeError::Denied("no user gesture".to_string()));
        }
        inner.state = DeviceState::Running;
        Ok(())
    }

    fn current_time(&self) -> Duration {
        self.inner.lock().now
    }

    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn start_voice(&self, request: VoiceRequest) -> Result<VoiceId, BridgeError> {
        let mut inner = self.inner.lock();
        if inner.state != DeviceState::Running {
            return Err(BridgeError::OperationFailed("device suspended".to_string()));
        }
        let id = VoiceId::new();
        inner.started.push(request.clone());
        inner.voices.insert(id, request);
        Ok(id)
    }

    fn stop_voice(&self, voice: VoiceId) -> Result<VoiceStop, BridgeError> {
        match self.inner.lock().voices.remove(&voice) {
            Some(_) => Ok(VoiceStop::Stopped),
            None => Ok(VoiceStop::AlreadyStopped),
        }
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// In-memory asset store with per-path gates and a fetch counter.
#[derive(Default)]
pub struct FakeFetcher {
    assets: Mutex<HashMap<String, Bytes>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a clip of `millis` milliseconds for [`FakeDecoder`].
    pub fn insert_clip(&self, path: &str, millis: usize) {
        self.insert_bytes(path, Bytes::from(vec![1u8; millis]));
    }

    pub fn insert_bytes(&self, path: &str, bytes: Bytes) {
        self.assets.lock().insert(path.to_string(), bytes);
    }

    /// Hold fetches of `path` until the returned handle is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches.lock().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes, BridgeError> {
        *self.fetches.lock().entry(path.to_string()).or_default() += 1;

        let gate = self.gates.lock().get(path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.assets
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Decodes `n` bytes into `n` mono frames at [`FAKE_RATE`]; the payload
/// `b"corrupt"` fails.
#[derive(Default)]
pub struct FakeDecoder {
    decodes: AtomicUsize,
}

impl FakeDecoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl BufferDecoder for FakeDecoder {
    fn decode(&self, path: &str, bytes: &[u8]) -> core_playback::Result<DecodedBuffer> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if bytes == b"corrupt" {
            return Err(PlaybackError::DecodeFailed {
                path: path.to_string(),
                reason: "not audio".to_string(),
            });
        }
        DecodedBuffer::new(vec![0.25; bytes.len()], 1, FAKE_RATE).map_err(PlaybackError::from)
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub engine: Arc<AudioEngine>,
    pub device: Arc<FakeDevice>,
    pub fetcher: Arc<FakeFetcher>,
    pub decoder: Arc<FakeDecoder>,
    pub events: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_device(FakeDevice::running())
    }

    pub fn with_device(device: Arc<FakeDevice>) -> Self {
        let fetcher = FakeFetcher::new();
        let decoder = FakeDecoder::new();
        let events = EventBus::new(64);

        let config = EngineConfig::builder()
            .asset_fetcher(fetcher.clone())
            .device(device.clone())
            .event_bus(events.clone())
            .build()
            .expect("complete config");

        Self {
            engine: Arc::new(AudioEngine::with_decoder(config, decoder.clone())),
            device,
            fetcher,
            decoder,
            events,
        }
    }
}

pub fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

/// Assert two durations agree to within a millisecond.
pub fn assert_close(actual: Duration, expected: Duration) {
    let diff = (actual.as_secs_f64() - expected.as_secs_f64()).abs();
    assert!(
        diff < 0.001,
        "expected {:?}, got {:?} (diff {}s)",
        expected,
        actual,
        diff
    );
}
