/// Panel error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid panel data: {0}")]
    Data(#[from] serde_json::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] klaxon_playback::PlaybackError),

    #[error("Sound source error: {0}")]
    Source(#[from] klaxon_source::SourceError),

    #[error("Audio output error: {0}")]
    Audio(#[from] klaxon_audio_desktop::AudioError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for PanelError {
    fn from(err: config::ConfigError) -> Self {
        PanelError::Config(err.to_string())
    }
}
