//! Mute state
//!
//! Two independent sources: the panel's own toggle and the selected dashboard
//! variable. Either one mutes.

use crate::host::MuteCapability;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MuteState {
    /// Toggled by the user on the panel
    pub local: bool,
    /// Derived from the mute variable
    pub variable: bool,
}

impl MuteState {
    pub fn effective(&self) -> bool {
        self.local || self.variable
    }

    /// Re-derive the variable mute from `variable_name`.
    ///
    /// Without the capability, or without a selected variable, the variable
    /// source never mutes.
    pub fn refresh_variable(&mut self, capability: &MuteCapability, variable_name: Option<&str>) {
        let muted = match (capability.variables(), variable_name) {
            (Some(service), Some(name)) => {
                let value = service.resolve(&format!("${{{name}}}"));
                let muted = is_truthy(&value);
                debug!(variable = name, value = %value, muted, "Resolved mute variable");
                muted
            }
            _ => false,
        };
        self.variable = muted;
    }
}

/// Truthiness of a resolved variable value.
///
/// `true`, `yes`, `on` (any case) and non-zero numbers are truthy. Anything
/// else, including an unresolved `$reference`, is not.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    if ["true", "yes", "on"]
        .iter()
        .any(|word| value.eq_ignore_ascii_case(word))
    {
        return true;
    }
    value
        .parse::<f64>()
        .map(|number| number != 0.0 && !number.is_nan())
        .unwrap_or(false)
}
