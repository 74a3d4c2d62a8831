/// Desktop audio errors
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No output device
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Device could not be queried
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to play stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Failed to pause stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Container or codec not recognised
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Packet decoding failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Malformed `data:` reference
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// No such built-in sound
    #[error("Unknown built-in sound: {0}")]
    UnknownBuiltin(String),

    /// Audio thread could not be started or has stopped
    #[error("Audio thread error: {0}")]
    AudioThread(String),

    /// I/O error reading a sound file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<AudioError> for klaxon_playback::PlaybackError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::PlayError(message) => klaxon_playback::PlaybackError::StartRejected(message),
            other => klaxon_playback::PlaybackError::Backend(other.to_string()),
        }
    }
}
