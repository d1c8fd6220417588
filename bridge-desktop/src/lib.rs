//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `AssetFetcher` over a local asset directory using `tokio::fs`
//! - `AssetFetcher` over an HTTP origin using `reqwest`
//! - `AudioDevice` without real output (`HeadlessAudioDevice`), driven by a
//!   wall clock; used for tests, CI and servers
//! - `AudioDevice` backed by the system output via `cpal` (`cpal-output` feature)
//!
//! ## Feature Flags
//!
//! - `cpal-output`: Enable the `cpal` output device. Requires the platform
//!   audio development libraries (ALSA headers on Linux).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessAudioDevice, TokioAssetFetcher};
//! use bridge_traits::AssetFetcher;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fetcher = TokioAssetFetcher::new("./assets");
//!     let device = HeadlessAudioDevice::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod filesystem;
mod headless;
mod http;

#[cfg(feature = "cpal-output")]
mod output;

pub use filesystem::TokioAssetFetcher;
pub use headless::HeadlessAudioDevice;
pub use http::ReqwestAssetFetcher;

#[cfg(feature = "cpal-output")]
pub use output::CpalAudioDevice;
