//! System Audio Output using cpal
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread
//! that receives play/pause commands. Voices are mixed in the realtime
//! callback from a shared voice table; the device clock is the number of
//! frames rendered so far, so it only advances while the stream is running.

use async_trait::async_trait;
use bridge_traits::{
    audio::{AudioDevice, DecodedBuffer, DeviceState, VoiceId, VoiceRequest, VoiceStop},
    error::{BridgeError, Result},
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

// =============================================================================
// Mixer
// =============================================================================

struct MixVoice {
    id: VoiceId,
    buffer: Arc<DecodedBuffer>,
    /// Read position in source frames
    position: f64,
    /// Source frames consumed per output frame
    step: f64,
    looping: bool,
}

#[derive(Default)]
struct Mixer {
    voices: Vec<MixVoice>,
}

impl Mixer {
    /// Mix one output frame into `out`, advancing every voice.
    fn render_frame(&mut self, out: &mut [f32]) {
        out.iter_mut().for_each(|s| *s = 0.0);

        for voice in &mut self.voices {
            let frames = voice.buffer.frames();
            if frames == 0 {
                continue;
            }

            let source = voice.buffer.frame(voice.position as usize);
            for (channel, sample) in out.iter_mut().enumerate() {
                // Mono sources are duplicated across output channels
                *sample += source[channel.min(source.len() - 1)];
            }

            voice.position += voice.step;
            if voice.position >= frames as f64 {
                if voice.looping {
                    voice.position %= frames as f64;
                } else {
                    voice.position = frames as f64;
                }
            }
        }

        self.voices
            .retain(|v| v.looping || v.position < v.buffer.frames() as f64);
    }
}

// =============================================================================
// Stream thread
// =============================================================================

enum Command {
    Play(oneshot::Sender<std::result::Result<(), String>>),
    Shutdown,
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
    rendered: Arc<AtomicU64>,
) -> std::result::Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch = vec![0.0f32; channels];

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut mixer = mixer.lock();
            for frame in data.chunks_mut(channels) {
                mixer.render_frame(&mut scratch);
                for (out, sample) in frame.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(sample.clamp(-1.0, 1.0));
                }
            }
            rendered.fetch_add((data.len() / channels) as u64, Ordering::Relaxed);
        },
        move |err| {
            error!(error = %err, "Audio stream error");
        },
        None,
    )
}

fn open_stream(
    mixer: Arc<Mutex<Mixer>>,
    rendered: Arc<AtomicU64>,
) -> std::result::Result<(Stream, u32), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "No default output device found".to_string())?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = device
        .default_output_config()
        .map_err(|e| format!("Failed to get default config: {}", e))?;
    let sample_format = supported.sample_format();
    let config = supported.config();

    info!(
        device = %name,
        sample_rate = config.sample_rate.0,
        channels = config.channels,
        format = ?sample_format,
        "Opening audio output"
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer, rendered),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer, rendered),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer, rendered),
        other => return Err(format!("Unsupported sample format: {:?}", other)),
    }
    .map_err(|e| format!("Failed to build stream: {}", e))?;

    // Streams may auto-start on some hosts; hold output until resumed
    if let Err(e) = stream.pause() {
        debug!(error = %e, "Stream pause not supported");
    }

    Ok((stream, config.sample_rate.0))
}

fn run_stream_thread(stream: Stream, commands: mpsc::Receiver<Command>) {
    while let Ok(command) = commands.recv() {
        match command {
            Command::Play(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| format!("Failed to start stream: {}", e));
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
    debug!("Audio stream thread exiting");
}

// =============================================================================
// Device
// =============================================================================

/// Audio device backed by the default system output
pub struct CpalAudioDevice {
    sample_rate: u32,
    state: Mutex<DeviceState>,
    mixer: Arc<Mutex<Mixer>>,
    rendered: Arc<AtomicU64>,
    commands: Mutex<mpsc::Sender<Command>>,
}

impl CpalAudioDevice {
    /// Open the default output device. The device starts `Suspended`.
    pub fn open() -> Result<Self> {
        let mixer = Arc::new(Mutex::new(Mixer::default()));
        let rendered = Arc::new(AtomicU64::new(0));
        let (command_tx, command_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::sync_channel(1);

        let thread_mixer = Arc::clone(&mixer);
        let thread_rendered = Arc::clone(&rendered);
        thread::Builder::new()
            .name("soundboard-audio".to_string())
            .spawn(move || match open_stream(thread_mixer, thread_rendered) {
                Ok((stream, sample_rate)) => {
                    let _ = init_tx.send(Ok(sample_rate));
                    run_stream_thread(stream, command_rx);
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                }
            })
            .map_err(BridgeError::Io)?;

        let sample_rate = init_rx
            .recv()
            .map_err(|_| BridgeError::NotAvailable("audio thread exited".to_string()))?
            .map_err(BridgeError::NotAvailable)?;

        Ok(Self {
            sample_rate,
            state: Mutex::new(DeviceState::Suspended),
            mixer,
            rendered,
            commands: Mutex::new(command_tx),
        })
    }
}

#[async_trait]
impl AudioDevice for CpalAudioDevice {
    fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    async fn resume(&self) -> Result<()> {
        if self.state() == DeviceState::Running {
            return Ok(());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .lock()
            .send(Command::Play(reply_tx))
            .map_err(|_| BridgeError::NotAvailable("audio thread exited".to_string()))?;

        match reply_rx.await {
            Ok(Ok(())) => {
                *self.state.lock() = DeviceState::Running;
                info!("Audio output running");
                Ok(())
            }
            Ok(Err(reason)) => Err(BridgeError::Denied(reason)),
            Err(_) => Err(BridgeError::NotAvailable(
                "audio thread exited".to_string(),
            )),
        }
    }

    fn current_time(&self) -> Duration {
        let frames = self.rendered.load(Ordering::Relaxed);
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start_voice(&self, request: VoiceRequest) -> Result<VoiceId> {
        let buffer = request.buffer;
        if buffer.is_empty() {
            return Err(BridgeError::InvalidData("buffer holds no audio".to_string()));
        }

        let id = VoiceId::new();
        let position = request.offset.as_secs_f64() * buffer.sample_rate() as f64;
        let voice = MixVoice {
            id,
            position: position.min(buffer.frames() as f64 - 1.0).max(0.0),
            step: buffer.sample_rate() as f64 / self.sample_rate as f64,
            looping: request.looping,
            buffer,
        };

        self.mixer.lock().voices.push(voice);
        Ok(id)
    }

    fn stop_voice(&self, voice: VoiceId) -> Result<VoiceStop> {
        let mut mixer = self.mixer.lock();
        let before = mixer.voices.len();
        mixer.voices.retain(|v| v.id != voice);

        if mixer.voices.len() < before {
            Ok(VoiceStop::Stopped)
        } else {
            Ok(VoiceStop::AlreadyStopped)
        }
    }
}

impl Drop for CpalAudioDevice {
    fn drop(&mut self) {
        if self.commands.lock().send(Command::Shutdown).is_err() {
            warn!("Audio thread already gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(samples: Vec<f32>, channels: u16, looping: bool) -> MixVoice {
        MixVoice {
            id: VoiceId::new(),
            buffer: Arc::new(DecodedBuffer::new(samples, channels, 48_000).unwrap()),
            position: 0.0,
            step: 1.0,
            looping,
        }
    }

    #[test]
    fn test_mixer_sums_voices_and_duplicates_mono() {
        let mut mixer = Mixer::default();
        mixer.voices.push(voice(vec![0.25, 0.25], 1, true));
        mixer.voices.push(voice(vec![0.5, 0.0, 0.5, 0.0], 2, true));

        let mut out = [0.0f32; 2];
        mixer.render_frame(&mut out);
        assert_eq!(out, [0.75, 0.25]);
    }

    #[test]
    fn test_looping_voice_wraps() {
        let mut mixer = Mixer::default();
        mixer.voices.push(voice(vec![1.0, 2.0], 1, true));

        let mut out = [0.0f32; 1];
        let rendered: Vec<f32> = (0..4)
            .map(|_| {
                mixer.render_frame(&mut out);
                out[0]
            })
            .collect();
        assert_eq!(rendered, vec![1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_one_shot_voice_is_removed_at_end() {
        let mut mixer = Mixer::default();
        mixer.voices.push(voice(vec![1.0, 1.0], 1, false));

        let mut out = [0.0f32; 1];
        mixer.render_frame(&mut out);
        mixer.render_frame(&mut out);
        assert!(mixer.voices.is_empty());
    }
}
