//! Classification of configured sound locations.

use crate::error::{Result, SourceError};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Scheme prefix of references to sounds compiled into the player.
pub const BUILTIN_SCHEME: &str = "builtin:";

/// Scheme prefix of inline `data:` references.
pub const DATA_SCHEME: &str = "data:";

/// A configured sound location, classified by how it must be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// `http`/`https` URL that must be fetched and buffered first
    Remote(Url),

    /// Inline `data:` reference
    Data(String),

    /// Sound shipped with the player (`builtin:<name>`)
    Builtin(String),

    /// Anything else is treated as a local asset path
    File(PathBuf),
}

impl SourceLocation {
    /// Classify a raw location string.
    ///
    /// Only `http` and `https` require a fetch. Leading and trailing whitespace
    /// is ignored; an empty location is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SourceError::InvalidLocation("location cannot be empty".into()));
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| SourceError::InvalidLocation(format!("{}: {}", raw, e)))?;
            return Ok(SourceLocation::Remote(url));
        }

        if lower.starts_with(DATA_SCHEME) {
            return Ok(SourceLocation::Data(raw.to_string()));
        }

        if let Some(name) = raw.strip_prefix(BUILTIN_SCHEME) {
            return Ok(SourceLocation::Builtin(name.to_string()));
        }

        Ok(SourceLocation::File(PathBuf::from(raw)))
    }

    /// Whether resolving this location needs a network fetch.
    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Remote(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Remote(url) => write!(f, "{}", url),
            SourceLocation::Data(_) => write!(f, "data:<inline>"),
            SourceLocation::Builtin(name) => write!(f, "{}{}", BUILTIN_SCHEME, name),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}
