//! Symphonia decoding of generated WAV fixtures.

mod support;

use bytes::Bytes;
use core_playback::{AudioEngine, BufferDecoder, PlayOutcome, SymphoniaDecoder};
use core_runtime::config::EngineConfig;
use std::io::Cursor;
use std::time::Duration;
use support::{assert_close, secs, FakeDevice, FakeFetcher};

fn wav_bytes(channels: u16, sample_rate: u32, frames: usize, value: i16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames * channels as usize {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[test]
fn test_decode_stereo_wav() {
    let bytes = wav_bytes(2, 8000, 1000, 16384);

    let buffer = SymphoniaDecoder::new()
        .decode("sounds/stereo.wav", &bytes)
        .unwrap();

    assert_eq!(buffer.channels(), 2);
    assert_eq!(buffer.sample_rate(), 8000);
    assert_eq!(buffer.frames(), 1000);
    assert_eq!(buffer.duration(), Duration::from_millis(125));
    assert!(buffer
        .samples()
        .iter()
        .all(|sample| (sample - 0.5).abs() < 1e-3));
}

#[test]
fn test_decode_mono_wav() {
    let bytes = wav_bytes(1, 22050, 2205, -8192);

    let buffer = SymphoniaDecoder::new().decode("mono.wav", &bytes).unwrap();

    assert_eq!(buffer.channels(), 1);
    assert_eq!(buffer.frames(), 2205);
    assert_eq!(buffer.frame(0), &[-0.25]);
}

#[test]
fn test_decode_wav_without_frames_is_empty_audio() {
    let bytes = wav_bytes(1, 8000, 0, 0);

    let err = SymphoniaDecoder::new().decode("empty.wav", &bytes).unwrap_err();

    assert!(err.is_decode_error());
}

#[test]
fn test_decode_truncated_payload_fails() {
    let mut bytes = wav_bytes(1, 8000, 100, 0);
    bytes.truncate(20);

    let err = SymphoniaDecoder::new().decode("short.wav", &bytes).unwrap_err();

    assert!(err.is_decode_error());
}

#[tokio::test]
async fn test_engine_plays_real_wav() {
    let fetcher = FakeFetcher::new();
    fetcher.insert_bytes("sounds/tone.wav", Bytes::from(wav_bytes(2, 8000, 8000, 1000)));
    let device = FakeDevice::running();

    let config = EngineConfig::builder()
        .asset_fetcher(fetcher.clone())
        .device(device.clone())
        .build()
        .unwrap();
    let engine = AudioEngine::new(config);

    let summary = engine.preload(["sounds/tone.wav"]).await;
    assert_eq!(summary.loaded, 1);

    let outcome = engine.play("sounds/tone.wav", "tone", secs(2.5)).await;
    match outcome {
        PlayOutcome::Started { offset } => assert_close(offset, secs(0.5)),
        other => panic!("expected Started, got {:?}", other),
    }

    device.advance(secs(0.25));
    assert_close(engine.stop("tone"), secs(0.75));
    assert_eq!(fetcher.fetch_count("sounds/tone.wav"), 1);
}
