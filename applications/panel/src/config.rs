/// Host configuration for the standalone panel runner
use crate::error::{PanelError, Result};
use crate::host::{MuteCapability, StaticVariables};
use crate::options::{PanelOptions, DEFAULT_SOUND};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostConfig {
    /// Options as the dashboard would persist them
    #[serde(default)]
    pub panel: PanelOptions,

    #[serde(default)]
    pub host: HostSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostSettings {
    /// Sound used when the panel has no sound URL
    #[serde(default = "default_sound")]
    pub default_sound: String,

    /// Feature flag: allow muting by dashboard variable
    #[serde(default)]
    pub mute_by_variable: bool,

    /// Dashboard variables (name -> value)
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    /// How often the data file is re-read
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// JSON file holding the panel data
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Base directory for relative sound paths
    #[serde(default)]
    pub asset_root: Option<PathBuf>,
}

impl HostConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `klaxon.toml` in the working directory; a missing
    /// default file is fine. Environment variables prefixed `KLAXON_` override
    /// file values, with `__` between sections (`KLAXON_PANEL__VOLUME=40`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PanelError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from("klaxon.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("KLAXON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.panel.volume) {
            return Err(PanelError::Config(format!(
                "Volume must be between 0 and 100, got {}",
                self.panel.volume
            )));
        }

        if !self.panel.start_at.is_finite() || self.panel.start_at < 0.0 {
            return Err(PanelError::Config(format!(
                "Start offset must be a non-negative number of seconds, got {}",
                self.panel.start_at
            )));
        }

        if self.host.poll_interval_ms == 0 {
            return Err(PanelError::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }

        if self.host.default_sound.trim().is_empty() {
            return Err(PanelError::Config(
                "Default sound must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Mute capability implied by the feature flag.
    pub fn mute_capability(&self) -> MuteCapability {
        if self.host.mute_by_variable {
            MuteCapability::ByVariable(Arc::new(StaticVariables::new(
                self.host.variables.clone(),
            )))
        } else {
            MuteCapability::Disabled
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.host.poll_interval_ms)
    }
}

// Default values
fn default_sound() -> String {
    DEFAULT_SOUND.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            default_sound: default_sound(),
            mute_by_variable: false,
            variables: BTreeMap::new(),
            poll_interval_ms: default_poll_interval_ms(),
            data_path: None,
            asset_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.host.default_sound, DEFAULT_SOUND);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(!config.mute_capability().is_enabled());
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut config = HostConfig::default();
        config.panel.volume = 101;
        assert!(matches!(config.validate(), Err(PanelError::Config(_))));
        config.panel.volume = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_negative_start_and_zero_poll() {
        let mut config = HostConfig::default();
        config.panel.start_at = -0.5;
        assert!(config.validate().is_err());

        let mut config = HostConfig::default();
        config.host.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn feature_flag_enables_variable_mute() {
        let mut config = HostConfig::default();
        config.host.mute_by_variable = true;
        config.host.variables.insert("muted".into(), "1".into());
        let capability = config.mute_capability();
        assert_eq!(capability.variables().unwrap().resolve("$muted"), "1");
    }
}
