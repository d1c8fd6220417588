//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements for the
//! soundboard core.
//!
//! ## Traits
//!
//! - [`AudioDevice`](audio::AudioDevice) - Output device, mixing graph and device clock
//! - [`AssetFetcher`](assets::AssetFetcher) - Raw bytes behind a logical asset path
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and include context such as the asset path.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one instance can be shared by
//! every async task of the core.

pub mod assets;
pub mod audio;
pub mod error;
pub mod logging;

pub use error::BridgeError;

pub use assets::{AssetFetcher, RetryPolicy};
pub use audio::{AudioDevice, DecodedBuffer, DeviceState, VoiceId, VoiceRequest, VoiceStop};
pub use logging::{LogEntry, LogLevel, LoggerSink};
