//! Panel options as persisted by the dashboard host
//!
//! Keys follow the host's JSON (`soundURL`, `startAt`, ...). Lowercase
//! aliases let the same options be set through `KLAXON_PANEL__*` environment
//! variables, whose keys arrive lowercased.

use crate::host::MuteCapability;
use klaxon_playback::PlaybackConfiguration;
use serde::{Deserialize, Serialize};

/// Default alert sound, used when no sound URL is configured
pub const DEFAULT_SOUND: &str = "builtin:flip-flap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOptions {
    /// Play on alert at all
    pub enabled: bool,

    /// Sound location; empty means the default sound
    #[serde(rename = "soundURL", alias = "soundurl")]
    pub sound_url: String,

    /// 0-100
    pub volume: i64,

    #[serde(rename = "loop")]
    pub looping: bool,

    /// Seconds
    #[serde(alias = "startat")]
    pub start_at: f64,

    /// Variable whose truthy value mutes the panel
    #[serde(
        alias = "mutevariableselect",
        skip_serializing_if = "Option::is_none"
    )]
    pub mute_variable_select: Option<String>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            sound_url: String::new(),
            volume: 100,
            looping: false,
            start_at: 0.0,
            mute_variable_select: None,
        }
    }
}

impl PanelOptions {
    /// Configured sound, or `default_sound` when none is set.
    pub fn sound_location<'a>(&'a self, default_sound: &'a str) -> &'a str {
        let url = self.sound_url.trim();
        if url.is_empty() {
            default_sound
        } else {
            url
        }
    }

    /// Selected mute variable, if any.
    pub fn mute_variable(&self) -> Option<&str> {
        self.mute_variable_select
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Playback settings for this cycle (volume normalized to [0, 1]).
    pub fn playback_configuration(&self, default_sound: &str) -> PlaybackConfiguration {
        PlaybackConfiguration::new(
            self.sound_location(default_sound),
            self.volume as f32 / 100.0,
            self.looping,
            self.start_at,
        )
    }
}

/// One option editor shown by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionEditor {
    pub path: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(flatten)]
    pub kind: EditorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorKind {
    #[serde(rename_all = "camelCase")]
    BooleanSwitch { default_value: bool },

    #[serde(rename_all = "camelCase")]
    TextInput { default_value: String },

    #[serde(rename_all = "camelCase")]
    SliderInput {
        default_value: i64,
        min: i64,
        max: i64,
        step: i64,
    },

    #[serde(rename_all = "camelCase")]
    NumberInput { default_value: f64, min: f64 },

    #[serde(rename_all = "camelCase")]
    VariableSelect {
        placeholder: &'static str,
        clearable: bool,
        options: Vec<SelectOption>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Option editors for the panel. The mute variable select is only offered
/// when muting by variable is available.
pub fn options_schema(mute: &MuteCapability) -> Vec<OptionEditor> {
    let defaults = PanelOptions::default();
    let mut editors = vec![
        OptionEditor {
            path: "enabled",
            name: "Enabled",
            description: "Enable or disable the sound maker panel.",
            kind: EditorKind::BooleanSwitch {
                default_value: defaults.enabled,
            },
        },
        OptionEditor {
            path: "soundURL",
            name: "Sound URL",
            description: "URL of the sound to play when the check is triggered.",
            kind: EditorKind::TextInput {
                default_value: defaults.sound_url.clone(),
            },
        },
        OptionEditor {
            path: "volume",
            name: "Volume",
            description: "Volume of the sound.",
            kind: EditorKind::SliderInput {
                default_value: defaults.volume,
                min: 0,
                max: 100,
                step: 1,
            },
        },
        OptionEditor {
            path: "loop",
            name: "Loop",
            description: "Whether the sound should loop.",
            kind: EditorKind::BooleanSwitch {
                default_value: defaults.looping,
            },
        },
        OptionEditor {
            path: "startAt",
            name: "Start at",
            description: "Position in seconds from which the sound starts.",
            kind: EditorKind::NumberInput {
                default_value: defaults.start_at,
                min: 0.0,
            },
        },
    ];

    if let Some(service) = mute.variables() {
        let options = service
            .variables()
            .into_iter()
            .map(|variable| SelectOption {
                label: variable.display_label().to_string(),
                value: variable.name,
            })
            .collect();

        editors.push(OptionEditor {
            path: "muteVariableSelect",
            name: "Mute variable",
            description: "Dashboard variable that mutes the panel when truthy.",
            kind: EditorKind::VariableSelect {
                placeholder: "Select variable",
                clearable: true,
                options,
            },
        });
    }

    editors
}
