//! Playback configuration with clamped values

use serde::{Deserialize, Serialize};

/// Settings applied to the live audio handle.
///
/// Volume and start offset are clamped on every assignment, so an out-of-range
/// value is never observable after construction or a setter call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfiguration")]
pub struct PlaybackConfiguration {
    source_location: String,
    volume: f32,
    looping: bool,
    start_offset: f64,
}

impl PlaybackConfiguration {
    /// Create a configuration, clamping volume to [0, 1] and offset to >= 0.
    pub fn new(
        source_location: impl Into<String>,
        volume: f32,
        looping: bool,
        start_offset: f64,
    ) -> Self {
        Self {
            source_location: source_location.into(),
            volume: clamp_volume(volume),
            looping,
            start_offset: clamp_offset(start_offset),
        }
    }

    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Seconds from which playback (re)starts.
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    pub fn set_source_location(&mut self, location: impl Into<String>) {
        self.source_location = location.into();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_start_offset(&mut self, seconds: f64) {
        self.start_offset = clamp_offset(seconds);
    }

    /// Builder-style volume setter.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.set_volume(volume);
        self
    }

    /// Builder-style loop setter.
    #[must_use]
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Builder-style start offset setter.
    #[must_use]
    pub fn with_start_offset(mut self, seconds: f64) -> Self {
        self.set_start_offset(seconds);
        self
    }
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self::new(String::new(), 1.0, false, 0.0)
    }
}

#[derive(Deserialize)]
struct RawConfiguration {
    source_location: String,
    volume: f32,
    looping: bool,
    start_offset: f64,
}

impl From<RawConfiguration> for PlaybackConfiguration {
    fn from(raw: RawConfiguration) -> Self {
        Self::new(raw.source_location, raw.volume, raw.looping, raw.start_offset)
    }
}

/// Clamp a volume into [0, 1]. NaN maps to 0.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Clamp a seek offset to >= 0. NaN maps to 0.
pub fn clamp_offset(seconds: f64) -> f64 {
    if seconds.is_nan() {
        0.0
    } else {
        seconds.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration() {
        let config = PlaybackConfiguration::default();
        assert_eq!(config.volume(), 1.0);
        assert!(!config.looping());
        assert_eq!(config.start_offset(), 0.0);
        assert!(config.source_location().is_empty());
    }

    #[test]
    fn constructor_clamps() {
        let config = PlaybackConfiguration::new("a.mp3", 1.7, true, -3.0);
        assert_eq!(config.volume(), 1.0);
        assert_eq!(config.start_offset(), 0.0);

        let config = PlaybackConfiguration::new("a.mp3", -0.2, false, 2.5);
        assert_eq!(config.volume(), 0.0);
        assert_eq!(config.start_offset(), 2.5);
    }

    #[test]
    fn setters_clamp() {
        let mut config = PlaybackConfiguration::default();
        config.set_volume(42.0);
        assert_eq!(config.volume(), 1.0);
        config.set_volume(0.25);
        assert_eq!(config.volume(), 0.25);
        config.set_start_offset(-0.001);
        assert_eq!(config.start_offset(), 0.0);
    }

    #[test]
    fn nan_is_clamped_to_zero() {
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_offset(f64::NAN), 0.0);
    }

    #[test]
    fn deserialization_clamps() {
        let config: PlaybackConfiguration = serde_json::from_str(
            r#"{"source_location":"x","volume":3.0,"looping":true,"start_offset":-1.0}"#,
        )
        .unwrap();
        assert_eq!(config.volume(), 1.0);
        assert_eq!(config.start_offset(), 0.0);
    }
}
