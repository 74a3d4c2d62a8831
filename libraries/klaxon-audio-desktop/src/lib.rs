//! Desktop audio backend for Klaxon using CPAL
//!
//! Provides [`CpalBackend`], an [`AudioBackend`](klaxon_playback::AudioBackend)
//! that plays alert sounds on the default output device.
//!
//! # Features
//!
//! - Decoding of MP3, WAV, OGG, FLAC, AAC via Symphonia
//! - Base64 `data:` references and fetched in-memory buffers
//! - Built-in sounds synthesized at the device rate (`builtin:flip-flap`)
//! - Sample rate conversion with rubato
//! - Live volume, loop and position changes
//!
//! # Example
//!
//! ```no_run
//! use klaxon_audio_desktop::CpalBackend;
//! use klaxon_playback::{PlaybackConfiguration, PlaybackController};
//! use klaxon_source::{AudioSourceResolver, HttpFetcher};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(CpalBackend::new()?);
//! let resolver = AudioSourceResolver::new(Arc::new(HttpFetcher::new()?));
//! let controller = PlaybackController::new(backend, resolver)?;
//!
//! controller.configure(PlaybackConfiguration::new("builtin:flip-flap", 0.8, false, 0.0));
//! controller.play();
//! # Ok(())
//! # }
//! ```

mod builtin;
mod decode;
mod error;
mod output;

pub use builtin::{synthesize, BUILTIN_SOUNDS, DEFAULT_SOUND};
pub use decode::{
    decode_bytes, decode_data_uri, decode_file, extension_for_mime, extension_of, DecodedSound,
};
pub use error::{AudioError, Result};
pub use output::{load_playable, CpalBackend, CpalHandle};
