//! Recording backend for tests
//!
//! Records every call the controller makes and lets a test decide how starts
//! and opens behave. Handles report events like a real backend would.

use crate::backend::{AudioBackend, AudioHandle, EventSink, HandleEvent};
use crate::error::{PlaybackError, Result};
use klaxon_source::ResolvedSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A call made on a backend or handle, tagged by source generation.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleCall {
    Open { location: String },
    Start,
    Pause,
    SetPosition(f64),
    SetVolume(f32),
    SetLooping(bool),
    Release,
}

#[derive(Default)]
struct Recording {
    calls: Vec<(u64, HandleCall)>,
    sinks: HashMap<u64, EventSink>,
    playing: HashMap<u64, bool>,
    reject_start: Option<String>,
    fail_start_later: Option<String>,
    fail_open: Option<String>,
}

/// [`AudioBackend`] that records calls instead of producing sound.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<(u64, HandleCall)> {
        self.recording.lock().calls.clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &HandleCall) -> usize {
        self.recording
            .lock()
            .calls
            .iter()
            .filter(|(_, c)| c == call)
            .count()
    }

    /// Number of start requests.
    pub fn starts(&self) -> usize {
        self.count(&HandleCall::Start)
    }

    /// Locations opened, in order.
    pub fn opened(&self) -> Vec<String> {
        self.recording
            .lock()
            .calls
            .iter()
            .filter_map(|(_, c)| match c {
                HandleCall::Open { location } => Some(location.clone()),
                _ => None,
            })
            .collect()
    }

    /// Make `start` fail synchronously.
    pub fn reject_starts(&self, message: impl Into<String>) {
        self.recording.lock().reject_start = Some(message.into());
    }

    /// Make `start` succeed but report [`HandleEvent::StartFailed`].
    pub fn fail_starts_later(&self, message: impl Into<String>) {
        self.recording.lock().fail_start_later = Some(message.into());
    }

    /// Make `open` fail.
    pub fn fail_opens(&self, message: impl Into<String>) {
        self.recording.lock().fail_open = Some(message.into());
    }

    /// Restore default behaviour.
    pub fn reset_behaviour(&self) {
        let mut recording = self.recording.lock();
        recording.reject_start = None;
        recording.fail_start_later = None;
        recording.fail_open = None;
    }

    /// Simulate the newest handle reaching the end of its sound.
    pub fn finish_playback(&self) {
        let mut recording = self.recording.lock();
        let Some(generation) = recording.sinks.keys().max().copied() else {
            return;
        };
        if recording.playing.insert(generation, false) == Some(true) {
            if let Some(sink) = recording.sinks.get(&generation) {
                sink.emit(HandleEvent::Ended);
            }
        }
    }

    /// Emit an arbitrary event on the handle opened for `generation`.
    pub fn emit(&self, generation: u64, event: HandleEvent) {
        if let Some(sink) = self.recording.lock().sinks.get(&generation) {
            sink.emit(event);
        }
    }
}

impl AudioBackend for RecordingBackend {
    fn open(&self, source: &ResolvedSource, events: EventSink) -> Result<Box<dyn AudioHandle>> {
        let mut recording = self.recording.lock();
        recording.calls.push((
            source.generation,
            HandleCall::Open {
                location: source.location.clone(),
            },
        ));
        if let Some(message) = recording.fail_open.clone() {
            return Err(PlaybackError::Backend(message));
        }
        recording.sinks.insert(source.generation, events.clone());
        recording.playing.insert(source.generation, false);

        Ok(Box::new(RecordingHandle {
            generation: source.generation,
            events,
            recording: Arc::clone(&self.recording),
        }))
    }
}

struct RecordingHandle {
    generation: u64,
    events: EventSink,
    recording: Arc<Mutex<Recording>>,
}

impl RecordingHandle {
    fn record(&self, call: HandleCall) {
        self.recording.lock().calls.push((self.generation, call));
    }
}

impl AudioHandle for RecordingHandle {
    fn start(&mut self) -> Result<()> {
        self.record(HandleCall::Start);
        let mut recording = self.recording.lock();
        if let Some(message) = recording.reject_start.clone() {
            return Err(PlaybackError::StartRejected(message));
        }
        if let Some(message) = recording.fail_start_later.clone() {
            self.events.emit(HandleEvent::StartFailed { message });
            return Ok(());
        }
        recording.playing.insert(self.generation, true);
        self.events.emit(HandleEvent::Playing);
        Ok(())
    }

    fn pause(&mut self) {
        self.record(HandleCall::Pause);
        let mut recording = self.recording.lock();
        if recording.playing.insert(self.generation, false) == Some(true) {
            self.events.emit(HandleEvent::Paused);
        }
    }

    fn set_position(&mut self, seconds: f64) {
        self.record(HandleCall::SetPosition(seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(HandleCall::SetVolume(volume));
    }

    fn set_looping(&mut self, looping: bool) {
        self.record(HandleCall::SetLooping(looping));
    }

    fn release(&mut self) {
        self.record(HandleCall::Release);
        // Sink stays registered: a released handle may still report late
        self.recording.lock().playing.insert(self.generation, false);
    }
}
