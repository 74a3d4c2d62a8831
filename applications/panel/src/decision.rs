//! Play/stop decision, evaluated on every update cycle

use crate::data::PanelData;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertDecision {
    Play,
    Stop,
    /// No series at all; the host shows its data error view
    ShowError,
}

/// Decide what the sound should do for this cycle.
pub fn decide(enabled: bool, muted: bool, data: &PanelData) -> AlertDecision {
    if data.is_empty() {
        AlertDecision::ShowError
    } else if enabled && !muted && data.has_alert() {
        AlertDecision::Play
    } else {
        AlertDecision::Stop
    }
}
