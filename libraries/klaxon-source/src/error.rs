//! Error types for sound source resolution.

use thiserror::Error;

/// Errors that can occur while resolving a sound location.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Remote server answered with a non-success status
    #[error("Failed to fetch audio ({status})")]
    Fetch { status: u16 },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Location could not be interpreted
    #[error("Invalid sound location: {0}")]
    InvalidLocation(String),

    /// The resolver was torn down
    #[error("Resolver has been torn down")]
    TornDown,
}

impl SourceError {
    /// HTTP status carried by a fetch failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Fetch { status } => Some(*status),
            SourceError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
