//! # Format Detection Module
//!
//! Probe hints and codec classification for Symphonia.

use super::AudioCodec;
use crate::error::{PlaybackError, Result};
use std::path::Path;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Format detector for audio assets.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from an asset path.
    ///
    /// The extension guides Symphonia's probe; without one the probe
    /// auto-detects from the bytes.
    ///
    /// ```rust
    /// use core_playback::FormatDetector;
    /// use std::path::Path;
    ///
    /// let hint = FormatDetector::hint_from_path(Path::new("sounds/animals/cow.wav"));
    /// ```
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        } else {
            debug!(path = ?path, "No file extension, probe will auto-detect");
        }

        hint
    }

    /// Classify a Symphonia codec type.
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if [
            CODEC_TYPE_PCM_S16LE,
            CODEC_TYPE_PCM_S16BE,
            CODEC_TYPE_PCM_S24LE,
            CODEC_TYPE_PCM_S24BE,
            CODEC_TYPE_PCM_S32LE,
            CODEC_TYPE_PCM_S32BE,
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F32BE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_F64BE,
            CODEC_TYPE_PCM_U8,
        ]
        .contains(&codec_type)
        {
            AudioCodec::Wav
        } else {
            AudioCodec::Unknown
        }
    }

    /// Check that the codec is enabled in this build.
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        let enabled = match codec {
            AudioCodec::Wav => cfg!(feature = "decoder-wav"),
            AudioCodec::Mp3 => cfg!(feature = "decoder-mp3"),
            AudioCodec::Vorbis => cfg!(feature = "decoder-vorbis"),
            AudioCodec::Flac => cfg!(feature = "decoder-flac"),
            AudioCodec::Aac | AudioCodec::Opus | AudioCodec::Alac | AudioCodec::Unknown => false,
        };

        if enabled {
            Ok(())
        } else {
            Err(PlaybackError::UnsupportedCodec(format!("{:?}", codec)))
        }
    }
}
