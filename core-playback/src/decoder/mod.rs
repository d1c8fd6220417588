//! # Audio Decoder Module
//!
//! Whole-buffer audio decoding using the Symphonia library.
//!
//! ## Overview
//!
//! Soundboard clips are short, so each asset is decoded once, completely, into
//! a [`DecodedBuffer`] that lives for the rest of the process. Decoding is
//! CPU-bound and synchronous; the buffer cache runs it on the blocking pool.
//!
//! ## Supported Formats
//!
//! | Format | Feature Flag | License |
//! |--------|--------------|---------|
//! | WAV (PCM) | `decoder-wav` | Public domain |
//! | MP3 | `decoder-mp3` | Patents expired |
//! | Ogg Vorbis | `decoder-vorbis` | BSD-3 |
//! | FLAC | `decoder-flac` | BSD-3 |
//!
//! ## Pipeline
//!
//! ```text
//! bytes → MediaSourceStream → FormatReader → Decoder → SampleConverter → DecodedBuffer
//! ```

mod format_detector;
mod sample_converter;
mod symphonia;

pub use self::symphonia::SymphoniaDecoder;
pub use format_detector::FormatDetector;
pub use sample_converter::SampleConverter;

use crate::error::Result;
use bridge_traits::DecodedBuffer;

/// Codec family of a decoded track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    Unknown,
}

/// Turns raw asset bytes into a decoded buffer.
///
/// `path` is the logical asset path. It is used as a format hint (file
/// extension) and for error context only.
pub trait BufferDecoder: Send + Sync {
    fn decode(&self, path: &str, bytes: &[u8]) -> Result<DecodedBuffer>;
}
