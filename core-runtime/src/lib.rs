//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the soundboard core:
//! - Logging and tracing infrastructure
//! - Engine configuration with fail-fast capability checks
//! - User settings snapshot and persistence
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the playback and service
//! layers depend on. It establishes the logging conventions and event
//! broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod settings;

pub use error::{Error, Result};
