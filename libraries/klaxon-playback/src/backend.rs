//! Platform audio backend traits
//!
//! The controller never touches platform audio directly. A backend opens a
//! handle for a resolved source; the handle is driven by the controller and
//! reports what actually happens through an [`EventSink`].

use crate::error::Result;
use klaxon_source::ResolvedSource;
use tokio::sync::mpsc::UnboundedSender;

/// Notifications a handle reports about its own playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    /// Audio is audible
    Playing,

    /// Playback was paused
    Paused,

    /// A non-looping sound reached its end
    Ended,

    /// A start request accepted by [`AudioHandle::start`] failed later
    StartFailed { message: String },
}

/// Channel through which a handle reports [`HandleEvent`]s.
///
/// Events are tagged with the generation of the source the handle was opened
/// for, so notifications from a replaced handle are ignored.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: UnboundedSender<(u64, HandleEvent)>,
}

impl EventSink {
    pub fn new(generation: u64, tx: UnboundedSender<(u64, HandleEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report an event. Never blocks; safe to call from an audio callback.
    pub fn emit(&self, event: HandleEvent) {
        // Receiver is gone once the controller is dropped
        let _ = self.tx.send((self.generation, event));
    }
}

/// A single playable sound owned by the controller.
///
/// Contract:
/// - a successful [`start`](Self::start) is followed by [`HandleEvent::Playing`]
///   (or [`HandleEvent::StartFailed`])
/// - [`pause`](Self::pause) on a started handle is followed by [`HandleEvent::Paused`]
/// - the other setters apply immediately and never fail
pub trait AudioHandle: Send {
    /// Request playback from the current position.
    fn start(&mut self) -> Result<()>;

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Move the playback position (seconds, already clamped to >= 0).
    fn set_position(&mut self, seconds: f64);

    /// Set the volume (already clamped to [0, 1]).
    fn set_volume(&mut self, volume: f32);

    /// Enable or disable looping.
    fn set_looping(&mut self, looping: bool);

    /// Stop and free platform resources. Called exactly once by the controller.
    fn release(&mut self);
}

/// Opens handles for resolved sources.
pub trait AudioBackend: Send + Sync {
    /// Open a handle. May block while decoding; the controller calls it from a
    /// blocking-capable thread.
    fn open(&self, source: &ResolvedSource, events: EventSink) -> Result<Box<dyn AudioHandle>>;
}
