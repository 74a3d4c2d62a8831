//! Controller events
//!
//! Broadcast to subscribers so the presentation layer can follow what the
//! controller is doing without polling.

use serde::{Deserialize, Serialize};

/// Events emitted by [`PlaybackController`](crate::PlaybackController)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControllerEvent {
    /// A new source location is being resolved
    SourceLoading {
        /// Location as configured
        location: String,
    },

    /// A handle for the source is installed and accepts play requests
    SourceReady {
        /// Location as configured
        location: String,
    },

    /// Resolving or opening the source failed; no sound will play until the
    /// location changes or is retried
    SourceFailed {
        /// Location as configured
        location: String,
        /// Error message
        message: String,
        /// HTTP status of a failed fetch
        status: Option<u16>,
    },

    /// The handle reported a playback state change
    StateChanged {
        /// Whether audio is now playing
        playing: bool,
    },

    /// A play request failed
    Error {
        /// Error message
        message: String,
    },

    /// Controller was disposed
    Disposed,
}
