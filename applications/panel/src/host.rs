//! Services provided by the dashboard host
//!
//! The panel only consumes the host's dashboard variables. Whether muting by
//! variable is available at all is decided once, when the panel is built, by
//! passing a [`MuteCapability`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dashboard variable as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Variable {
    /// Label shown to users; falls back to the name.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Dashboard variable lookup.
pub trait VariableService: Send + Sync {
    /// All variables on the dashboard.
    fn variables(&self) -> Vec<Variable>;

    /// Substitute variable references in `reference` (`$name` or `${name}`).
    ///
    /// Unknown references are returned unchanged.
    fn resolve(&self, reference: &str) -> String;
}

/// Fixed set of variables, e.g. from the host configuration file.
#[derive(Debug, Clone, Default)]
pub struct StaticVariables {
    values: BTreeMap<String, String>,
}

impl StaticVariables {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl VariableService for StaticVariables {
    fn variables(&self) -> Vec<Variable> {
        self.values
            .keys()
            .map(|name| Variable {
                name: name.clone(),
                label: None,
            })
            .collect()
    }

    fn resolve(&self, reference: &str) -> String {
        let name = reference
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .or_else(|| reference.strip_prefix('$'));

        name.and_then(|name| self.values.get(name))
            .cloned()
            .unwrap_or_else(|| reference.to_string())
    }
}

/// Whether the panel may derive mute from a dashboard variable.
#[derive(Clone, Default)]
pub enum MuteCapability {
    /// Local toggle only
    #[default]
    Disabled,

    /// Local toggle OR the truthiness of the selected variable
    ByVariable(Arc<dyn VariableService>),
}

impl MuteCapability {
    pub fn is_enabled(&self) -> bool {
        matches!(self, MuteCapability::ByVariable(_))
    }

    pub fn variables(&self) -> Option<&dyn VariableService> {
        match self {
            MuteCapability::Disabled => None,
            MuteCapability::ByVariable(service) => Some(service.as_ref()),
        }
    }
}

impl fmt::Debug for MuteCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuteCapability::Disabled => f.write_str("Disabled"),
            MuteCapability::ByVariable(_) => f.write_str("ByVariable"),
        }
    }
}
