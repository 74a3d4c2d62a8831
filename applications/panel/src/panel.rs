//! The alert panel
//!
//! Glue between the host's update cycle and the playback controller. Every
//! call to [`AlertPanel::update`] pushes the options into the controller and
//! re-evaluates the play/stop decision from scratch.

use crate::data::PanelData;
use crate::decision::{decide, AlertDecision};
use crate::host::MuteCapability;
use crate::mute::MuteState;
use crate::options::PanelOptions;
use klaxon_playback::{ControllerEvent, ControllerState, PlaybackController};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long a manual test plays before it is stopped
pub const TEST_SOUND_DURATION: Duration = Duration::from_secs(5);

/// Shown when the test sound is played while the panel is disabled
pub const TEST_WHILE_DISABLED_WARNING: &str =
    "Playing sound although the sound is disabled in panel options.";

/// What the panel shows after an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub decision: AlertDecision,
    pub mute: MuteState,
    pub muted: bool,
    pub playing: bool,
}

/// Result of pressing "Test Sound".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSoundOutcome {
    /// Playback was requested (false when the sound was already playing)
    pub started: bool,
    pub warning: Option<&'static str>,
}

pub struct AlertPanel {
    controller: PlaybackController,
    mute_capability: MuteCapability,
    default_sound: String,
    mute: MuteState,
    last: Option<(PanelOptions, PanelData)>,
    test_timer: Option<JoinHandle<()>>,
}

impl AlertPanel {
    pub fn new(
        controller: PlaybackController,
        mute_capability: MuteCapability,
        default_sound: impl Into<String>,
    ) -> Self {
        Self {
            controller,
            mute_capability,
            default_sound: default_sound.into(),
            mute: MuteState::default(),
            last: None,
            test_timer: None,
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn mute_state(&self) -> MuteState {
        self.mute
    }

    /// Controller events (source ready/failed, errors, play state).
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.controller.subscribe()
    }

    /// Push `options` into the controller without deciding anything.
    pub fn apply_options(&self, options: &PanelOptions) {
        self.controller
            .configure(options.playback_configuration(&self.default_sound));
    }

    /// Run one update cycle.
    pub fn update(&mut self, options: &PanelOptions, data: &PanelData) -> PanelView {
        self.apply_options(options);
        self.mute
            .refresh_variable(&self.mute_capability, options.mute_variable());

        let muted = self.mute.effective();
        let decision = decide(options.enabled, muted, data);
        match decision {
            AlertDecision::Play => self.controller.play(),
            // A running test sound ends on its own timer unless muted
            AlertDecision::Stop if self.test_running() && !muted => {
                debug!("Test sound running, stop deferred");
            }
            AlertDecision::Stop => self.controller.stop(),
            AlertDecision::ShowError => debug!("Panel has no data series"),
        }

        self.last = Some((options.clone(), data.clone()));
        self.view(decision)
    }

    /// Re-run the last update cycle, e.g. after a sound finished loading.
    pub fn rerun(&mut self) -> Option<PanelView> {
        let (options, data) = self.last.take()?;
        Some(self.update(&options, &data))
    }

    /// Flip the local mute toggle and re-evaluate.
    pub fn toggle_mute(&mut self) -> Option<PanelView> {
        self.set_local_mute(!self.mute.local)
    }

    pub fn set_local_mute(&mut self, muted: bool) -> Option<PanelView> {
        self.mute.local = muted;
        info!(muted, "Local mute changed");
        self.rerun()
    }

    /// Play the configured sound for [`TEST_SOUND_DURATION`], regardless of
    /// whether the panel is enabled. Does nothing if it is already playing or
    /// not loaded yet. Update cycles that decide to stop leave it running
    /// unless the panel is muted.
    pub fn test_sound(&mut self, enabled: bool) -> TestSoundOutcome {
        let warning = if enabled {
            None
        } else {
            warn!("{TEST_WHILE_DISABLED_WARNING}");
            Some(TEST_WHILE_DISABLED_WARNING)
        };

        if self.controller.is_playing() {
            return TestSoundOutcome {
                started: false,
                warning,
            };
        }
        if self.controller.state() != ControllerState::Ready {
            debug!("Test sound requested before the sound is loaded");
            return TestSoundOutcome {
                started: false,
                warning,
            };
        }

        self.controller.play();
        if let Some(timer) = self.test_timer.take() {
            timer.abort();
        }
        let controller = self.controller.clone();
        self.test_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(TEST_SOUND_DURATION).await;
            debug!("Test sound finished");
            controller.stop();
        }));

        TestSoundOutcome {
            started: true,
            warning,
        }
    }

    /// Stop everything and release the sound. The panel is unusable afterwards.
    pub fn dispose(&mut self) {
        if let Some(timer) = self.test_timer.take() {
            timer.abort();
        }
        self.last = None;
        self.controller.dispose();
    }

    fn test_running(&self) -> bool {
        self.test_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn view(&self, decision: AlertDecision) -> PanelView {
        PanelView {
            decision,
            mute: self.mute,
            muted: self.mute.effective(),
            playing: self.controller.is_playing(),
        }
    }
}

impl Drop for AlertPanel {
    fn drop(&mut self) {
        self.dispose();
    }
}
