//! # Audio Device Context
//!
//! Owns the single process-wide audio device. The device is created lazily
//! on first use through the injected factory and is never dropped while the
//! context lives. A failed creation is not cached: the next access retries.

use crate::error::{PlaybackError, Result};
use bridge_traits::{AudioDevice, DeviceState};
use core_runtime::config::DeviceFactory;
use core_runtime::events::{EventBus, SoundEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DeviceContext {
    factory: DeviceFactory,
    device: Mutex<Option<Arc<dyn AudioDevice>>>,
    events: Option<EventBus>,
}

impl DeviceContext {
    pub fn new(factory: DeviceFactory, events: Option<EventBus>) -> Self {
        Self {
            factory,
            device: Mutex::new(None),
            events,
        }
    }

    /// Shared device handle, created on first call.
    pub fn device(&self) -> Result<Arc<dyn AudioDevice>> {
        let mut slot = self.device.lock();
        if let Some(device) = slot.as_ref() {
            return Ok(Arc::clone(device));
        }

        let device = (self.factory)().map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;
        info!(
            sample_rate = device.sample_rate(),
            state = ?device.state(),
            "Audio device created"
        );
        *slot = Some(Arc::clone(&device));
        Ok(device)
    }

    /// Device state, or `None` if the device has not been created yet.
    pub fn state(&self) -> Option<DeviceState> {
        self.device.lock().as_ref().map(|device| device.state())
    }

    /// Bring the device to `Running`, returning it.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::DeviceUnavailable`] if the device cannot be created
    /// - [`PlaybackError::ResumeDenied`] if the platform refuses to resume
    pub async fn ensure_running(&self) -> Result<Arc<dyn AudioDevice>> {
        let device = self.device()?;
        if device.state() == DeviceState::Running {
            return Ok(device);
        }

        debug!("Resuming suspended audio device");
        match device.resume().await {
            Ok(()) => {
                self.emit(SoundEvent::DeviceResumed);
                Ok(device)
            }
            Err(e) => {
                let reason = e.to_string();
                self.emit(SoundEvent::DeviceResumeDenied {
                    reason: reason.clone(),
                });
                Err(PlaybackError::ResumeDenied(reason))
            }
        }
    }

    /// Resume the device if suspended. Never fails: a denial is logged and
    /// the device stays suspended until the next attempt.
    pub async fn resume(&self) -> DeviceState {
        match self.ensure_running().await {
            Ok(device) => device.state(),
            Err(e) => {
                warn!(error = %e, "Audio device not running");
                DeviceState::Suspended
            }
        }
    }

    fn emit(&self, event: SoundEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(event);
        }
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("state", &self.state())
            .finish()
    }
}
