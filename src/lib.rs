//! Workspace umbrella crate.
//!
//! Host applications depend on `soundboard-workspace` and pick a feature:
//! `desktop-shims` (default) pulls in the [`core_service`] façade wired to the
//! desktop bridges, `cpal-output` additionally enables real audio output, and
//! `engine-only` exposes just the [`core_playback`] engine for hosts that bring
//! their own bridges.

#[cfg(any(feature = "desktop-shims", feature = "cpal-output"))]
pub use core_service;

#[cfg(feature = "engine-only")]
pub use core_playback;
