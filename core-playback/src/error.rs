//! # Playback Error Types
//!
//! Errors raised inside the engine. None of them reach callers of the public
//! engine operations: they are logged and turned into degraded outcomes.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur while loading or playing a sound.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Load Errors
    // ========================================================================
    /// Raw bytes could not be retrieved for a path.
    #[error("Failed to fetch {path}: {reason}")]
    FetchFailed { path: String, reason: String },

    /// Bytes were retrieved but are not decodable audio.
    #[error("Failed to decode {path}: {reason}")]
    DecodeFailed { path: String, reason: String },

    /// Decoding succeeded but produced no frames.
    #[error("Decoded audio is empty: {0}")]
    EmptyAudio(String),

    /// Codec is not enabled in this build.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The audio device could not be created.
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The platform refused to start the audio device.
    #[error("Audio device resume denied: {0}")]
    ResumeDenied(String),

    /// A device operation failed.
    #[error("Audio device error: {0}")]
    Device(#[from] BridgeError),
}

impl PlaybackError {
    pub(crate) fn fetch(path: &str, reason: impl ToString) -> Self {
        Self::FetchFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(path: &str, reason: impl ToString) -> Self {
        Self::DecodeFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Fetch-side failure (path or transport).
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::FetchFailed { .. })
    }

    /// Payload failure (not audio, unsupported, or empty).
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailed { .. } | Self::EmptyAudio(_) | Self::UnsupportedCodec(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
