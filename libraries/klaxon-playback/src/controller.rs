//! Playback controller - core orchestration
//!
//! Owns at most one live [`AudioHandle`] and keeps it consistent with the
//! configuration pushed on every update cycle:
//!
//! - a changed source location is resolved in the background; the previous
//!   handle is released right away and the controller is `Uninitialized` until
//!   the new handle is installed
//! - volume, loop and start offset apply to the live handle immediately and are
//!   retained for a handle that is still being opened
//! - `play()` never restarts a sound that is already playing (or starting)
//! - `is_playing()` only changes on notifications from the handle itself
//!
//! Public operations never fail. Errors are logged and broadcast as
//! [`ControllerEvent`]s; after `dispose()` every operation is a no-op.

use crate::backend::{AudioBackend, AudioHandle, EventSink, HandleEvent};
use crate::config::{clamp_offset, clamp_volume, PlaybackConfiguration};
use crate::error::{PlaybackError, Result};
use crate::events::ControllerEvent;
use klaxon_source::{
    AudioSourceResolver, BufferRegistry, ResolveRequest, ResolvedSource, Resolution,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Capacity of the controller event channel
const EVENT_CAPACITY: usize = 64;

/// Externally visible controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// No handle yet (never configured, loading, or the source failed)
    Uninitialized,

    /// Handle installed, not playing
    Ready,

    /// Handle reported that it is playing
    Playing,

    /// Terminal
    Disposed,
}

struct LiveHandle {
    generation: u64,
    location: String,
    handle: Box<dyn AudioHandle>,
}

#[derive(Default)]
struct Inner {
    /// Retained settings, applied to every newly opened handle
    config: PlaybackConfiguration,

    handle: Option<LiveHandle>,

    /// Mirrors handle notifications only
    is_playing: bool,

    /// Start accepted, `Playing` not reported yet
    start_pending: bool,

    /// Pause issued, `Paused`/`Ended` not reported yet
    stop_pending: bool,

    disposed: bool,
}

struct Shared {
    backend: Arc<dyn AudioBackend>,
    resolver: AudioSourceResolver,
    state: Mutex<Inner>,
    events: broadcast::Sender<ControllerEvent>,
    handle_tx: mpsc::UnboundedSender<(u64, HandleEvent)>,
    runtime: RuntimeHandle,
}

/// Controls playback of a single alert sound.
///
/// Cheap to clone; clones control the same sound. Must be created from within
/// a Tokio runtime, which runs source resolution and handle notifications.
///
/// # Example
///
/// ```ignore
/// let controller = PlaybackController::new(backend, resolver)?;
/// controller.configure(PlaybackConfiguration::new("builtin:flip-flap", 0.8, true, 0.0));
/// controller.play();
/// ```
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    /// Create a controller driving handles opened by `backend`.
    ///
    /// # Errors
    /// Fails when called outside a Tokio runtime.
    pub fn new(backend: Arc<dyn AudioBackend>, resolver: AudioSourceResolver) -> Result<Self> {
        let runtime =
            RuntimeHandle::try_current().map_err(|e| PlaybackError::Runtime(e.to_string()))?;

        let (handle_tx, handle_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let shared = Arc::new(Shared {
            backend,
            resolver,
            state: Mutex::new(Inner::default()),
            events,
            handle_tx,
            runtime: runtime.clone(),
        });

        runtime.spawn(pump_handle_events(Arc::downgrade(&shared), handle_rx));

        Ok(Self { shared })
    }

    /// Apply a configuration.
    ///
    /// Only a changed source location triggers a reload; repeating the current
    /// location (loaded or still loading) is a no-op.
    pub fn configure(&self, config: PlaybackConfiguration) {
        let request = {
            let mut inner = self.shared.state.lock();
            if inner.disposed {
                return;
            }

            let previous = std::mem::replace(&mut inner.config, config.clone());
            if let Some(live) = inner.handle.as_mut() {
                if previous.volume() != config.volume() {
                    live.handle.set_volume(config.volume());
                }
                if previous.looping() != config.looping() {
                    live.handle.set_looping(config.looping());
                }
                if previous.start_offset() != config.start_offset() {
                    live.handle.set_position(config.start_offset());
                }
            }

            match self.shared.resolver.request(config.source_location()) {
                Ok(None) => None,
                Ok(Some(request)) => {
                    self.shared.release_live_handle(&mut inner);
                    Some(request)
                }
                Err(e) => {
                    self.shared.release_live_handle(&mut inner);
                    drop(inner);
                    self.shared
                        .report_source_failure(config.source_location(), &PlaybackError::from(e));
                    None
                }
            }
        };

        if let Some(request) = request {
            debug!(
                location = %request.location(),
                generation = request.generation(),
                remote = request.is_remote(),
                "Loading sound source"
            );
            self.shared.emit(ControllerEvent::SourceLoading {
                location: request.location().to_string(),
            });

            let shared = Arc::clone(&self.shared);
            self.shared.runtime.spawn(shared.load(request));
        }
    }

    /// Start playback unless already playing or starting.
    ///
    /// A rejected start is logged and broadcast, never returned.
    pub fn play(&self) {
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        if inner.start_pending || (inner.is_playing && !inner.stop_pending) {
            return;
        }

        let result = match inner.handle.as_mut() {
            Some(live) => live.handle.start(),
            None => {
                debug!("Play requested before a sound source is ready");
                return;
            }
        };

        match result {
            Ok(()) => {
                inner.start_pending = true;
                inner.stop_pending = false;
            }
            Err(e) => {
                drop(inner);
                error!(error = %e, "Error playing sound");
                self.shared.emit(ControllerEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Stop playback and rewind to the start offset.
    pub fn stop(&self) {
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        if inner.stop_pending || !(inner.is_playing || inner.start_pending) {
            return;
        }

        let offset = inner.config.start_offset();
        if let Some(live) = inner.handle.as_mut() {
            live.handle.pause();
            live.handle.set_position(offset);
        }
        inner.start_pending = false;
        inner.stop_pending = true;
    }

    /// Jump to `seconds` (clamped to >= 0) and retain it as the start offset.
    pub fn seek(&self, seconds: f64) {
        let seconds = clamp_offset(seconds);
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        inner.config.set_start_offset(seconds);
        if let Some(live) = inner.handle.as_mut() {
            live.handle.set_position(seconds);
        }
    }

    /// Change the volume (clamped to [0, 1]).
    pub fn set_volume(&self, volume: f32) {
        let volume = clamp_volume(volume);
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        inner.config.set_volume(volume);
        if let Some(live) = inner.handle.as_mut() {
            live.handle.set_volume(volume);
        }
    }

    /// Change looping on the fly.
    pub fn set_looping(&self, looping: bool) {
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        inner.config.set_looping(looping);
        if let Some(live) = inner.handle.as_mut() {
            live.handle.set_looping(looping);
        }
    }

    /// Whether the handle last reported that it is playing.
    pub fn is_playing(&self) -> bool {
        self.shared.state.lock().is_playing
    }

    pub fn state(&self) -> ControllerState {
        let inner = self.shared.state.lock();
        if inner.disposed {
            ControllerState::Disposed
        } else if inner.handle.is_none() {
            ControllerState::Uninitialized
        } else if inner.is_playing {
            ControllerState::Playing
        } else {
            ControllerState::Ready
        }
    }

    /// Retained configuration.
    pub fn configuration(&self) -> PlaybackConfiguration {
        self.shared.state.lock().config.clone()
    }

    /// Location of the installed handle, if any.
    pub fn loaded_location(&self) -> Option<String> {
        self.shared
            .state
            .lock()
            .handle
            .as_ref()
            .map(|live| live.location.clone())
    }

    /// Registry holding buffers of fetched sources.
    pub fn buffers(&self) -> &BufferRegistry {
        self.shared.resolver.registry()
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.shared.events.subscribe()
    }

    /// Release the handle and any fetched buffer. Further calls are no-ops.
    pub fn dispose(&self) {
        let mut inner = self.shared.state.lock();
        if inner.disposed {
            return;
        }
        self.shared.release_live_handle(&mut inner);
        inner.disposed = true;
        drop(inner);

        self.shared.resolver.teardown();
        info!("Playback controller disposed");
        self.shared.emit(ControllerEvent::Disposed);
    }
}

impl Shared {
    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn release_live_handle(&self, inner: &mut Inner) {
        if let Some(mut live) = inner.handle.take() {
            debug!(location = %live.location, generation = live.generation, "Releasing audio handle");
            live.handle.release();
        }
        let was_playing = inner.is_playing;
        inner.is_playing = false;
        inner.start_pending = false;
        inner.stop_pending = false;
        if was_playing {
            self.emit(ControllerEvent::StateChanged { playing: false });
        }
    }

    fn report_source_failure(&self, location: &str, err: &PlaybackError) {
        let status = match err {
            PlaybackError::Source(e) => e.status(),
            _ => None,
        };
        error!(location = %location, status = ?status, error = %err, "Failed to load sound");
        self.emit(ControllerEvent::SourceFailed {
            location: location.to_string(),
            message: err.to_string(),
            status,
        });
    }

    async fn load(self: Arc<Self>, request: ResolveRequest) {
        let location = request.location().to_string();
        let source = match self.resolver.materialize(request).await {
            Ok(Resolution::Ready(source)) => source,
            Ok(Resolution::Unchanged | Resolution::Superseded) => return,
            Err(e) => {
                self.report_source_failure(&location, &PlaybackError::from(e));
                return;
            }
        };

        let backend = Arc::clone(&self.backend);
        let sink = EventSink::new(source.generation, self.handle_tx.clone());
        let opened = tokio::task::spawn_blocking(move || {
            let handle = backend.open(&source, sink);
            (source, handle)
        })
        .await;

        match opened {
            Ok((source, handle)) => self.install(source, handle),
            Err(e) => error!(location = %location, error = %e, "Audio backend task failed"),
        }
    }

    fn install(&self, source: ResolvedSource, opened: Result<Box<dyn AudioHandle>>) {
        let mut inner = self.state.lock();
        if inner.disposed || !self.resolver.is_current(source.generation) {
            if let Ok(mut handle) = opened {
                handle.release();
            }
            debug!(
                location = %source.location,
                generation = source.generation,
                "Discarding handle for superseded source"
            );
            return;
        }

        match opened {
            Ok(mut handle) => {
                handle.set_looping(inner.config.looping());
                handle.set_volume(inner.config.volume());
                handle.set_position(inner.config.start_offset());

                self.release_live_handle(&mut inner);
                inner.handle = Some(LiveHandle {
                    generation: source.generation,
                    location: source.location.clone(),
                    handle,
                });
                drop(inner);

                info!(location = %source.location, "Sound ready");
                self.emit(ControllerEvent::SourceReady {
                    location: source.location,
                });
            }
            Err(e) => {
                // Forget the location so the next configure retries it
                self.resolver.abandon(source.generation);
                drop(inner);
                self.report_source_failure(&source.location, &e);
            }
        }
    }

    fn on_handle_event(&self, generation: u64, event: HandleEvent) {
        let mut inner = self.state.lock();
        if inner.disposed {
            return;
        }
        if inner.handle.as_ref().map(|live| live.generation) != Some(generation) {
            debug!(generation, ?event, "Ignoring event from replaced handle");
            return;
        }

        let was_playing = inner.is_playing;
        match event {
            HandleEvent::Playing => {
                inner.is_playing = true;
                inner.start_pending = false;
            }
            HandleEvent::Paused | HandleEvent::Ended => {
                inner.is_playing = false;
                inner.stop_pending = false;
            }
            HandleEvent::StartFailed { message } => {
                inner.start_pending = false;
                drop(inner);
                warn!(error = %message, "Error playing sound");
                self.emit(ControllerEvent::Error { message });
                return;
            }
        }

        let playing = inner.is_playing;
        drop(inner);
        if playing != was_playing {
            debug!(playing, "Playback state changed");
            self.emit(ControllerEvent::StateChanged { playing });
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(mut live) = self.state.get_mut().handle.take() {
            live.handle.release();
        }
    }
}

async fn pump_handle_events(
    shared: Weak<Shared>,
    mut rx: mpsc::UnboundedReceiver<(u64, HandleEvent)>,
) {
    while let Some((generation, event)) = rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.on_handle_event(generation, event);
    }
}
