//! Error types for playback control

use thiserror::Error;

/// Playback errors
///
/// None of these ever escape the controller's public operations; they are
/// logged and broadcast as [`ControllerEvent`](crate::ControllerEvent)s.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Sound source could not be resolved
    #[error("Sound source error: {0}")]
    Source(#[from] klaxon_source::SourceError),

    /// Audio backend failed to open or drive a handle
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Platform refused to start playback (e.g. autoplay restrictions)
    #[error("Playback start rejected: {0}")]
    StartRejected(String),

    /// No Tokio runtime available to run background work
    #[error("No async runtime available: {0}")]
    Runtime(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
