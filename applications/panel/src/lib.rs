//! Klaxon Panel Library
//!
//! Dashboard panel that plays an alert sound while its data reports an alert,
//! with a local mute toggle and optional mute by dashboard variable.
//!
//! This library exposes the panel components for the runner binary and tests.

pub mod config;
pub mod data;
pub mod decision;
pub mod error;
pub mod host;
pub mod mute;
pub mod options;
pub mod panel;

// Re-export commonly used types for convenience
pub use config::{HostConfig, HostSettings};
pub use data::{PanelData, Series};
pub use decision::{decide, AlertDecision};
pub use error::{PanelError, Result};
pub use host::{MuteCapability, StaticVariables, Variable, VariableService};
pub use mute::{is_truthy, MuteState};
pub use options::{options_schema, EditorKind, OptionEditor, PanelOptions, SelectOption, DEFAULT_SOUND};
pub use panel::{AlertPanel, PanelView, TestSoundOutcome, TEST_SOUND_DURATION, TEST_WHILE_DISABLED_WARNING};
