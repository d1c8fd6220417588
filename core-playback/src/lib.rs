//! # Playback Engine
//!
//! Multi-channel looping playback with a shared decoded-buffer cache.
//!
//! ## Overview
//!
//! This crate handles:
//! - Lazy creation and resume of the single audio device
//! - Fetching and decoding sounds (symphonia, feature-gated codecs)
//! - A path-keyed buffer cache that loads each sound once
//! - Independent named channels with offset-aware stop and resume
//!
//! [`AudioEngine`] is the entry point; the other modules are its building
//! blocks and are public for hosts that want to compose them differently.

pub mod cache;
pub mod channels;
pub mod context;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod unit;

pub use cache::{BufferCache, PreloadSummary};
pub use channels::StoppedUnit;
pub use decoder::{AudioCodec, BufferDecoder, FormatDetector, SampleConverter, SymphoniaDecoder};
pub use engine::{AudioEngine, PlayOutcome, DEFAULT_CHANNEL};
pub use error::{PlaybackError, Result};
pub use unit::normalize_offset;
