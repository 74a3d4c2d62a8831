//! Klaxon - Playback Control
//!
//! Platform-agnostic controller for a single alert sound.
//!
//! This crate provides:
//! - Clamped playback configuration (volume, loop, start offset)
//! - Idempotent play/stop that never restarts a playing sound
//! - Play state driven by the audio handle's own notifications
//! - Background source resolution that discards superseded results
//! - Deterministic release of handles and fetched buffers
//!
//! # Architecture
//!
//! `klaxon-playback` has no platform audio dependency. Audio output is
//! provided through the [`AudioBackend`] / [`AudioHandle`] traits; sources are
//! resolved by `klaxon-source`.
//!
//! Whether to play is decided by the caller on every update cycle; the
//! controller only keeps the audio consistent with what it is told.
//!
//! # Example
//!
//! ```ignore
//! use klaxon_playback::{PlaybackController, PlaybackConfiguration};
//! use klaxon_source::{AudioSourceResolver, HttpFetcher};
//! use std::sync::Arc;
//!
//! let resolver = AudioSourceResolver::new(Arc::new(HttpFetcher::new()?));
//! let controller = PlaybackController::new(backend, resolver)?;
//!
//! // Every update cycle
//! controller.configure(PlaybackConfiguration::new("builtin:flip-flap", 0.8, true, 0.0));
//! if alert_active {
//!     controller.play();
//! } else {
//!     controller.stop();
//! }
//! ```

mod backend;
mod config;
mod controller;
mod error;
mod events;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Public exports
pub use backend::{AudioBackend, AudioHandle, EventSink, HandleEvent};
pub use config::{clamp_offset, clamp_volume, PlaybackConfiguration};
pub use controller::{ControllerState, PlaybackController};
pub use error::{PlaybackError, Result};
pub use events::ControllerEvent;
