//! Sound source resolver.
//!
//! Turns a configured location into something the playback layer can open.
//! Remote URLs are fetched and buffered; everything else is passed through.
//!
//! Every accepted request is tagged with a generation number. A completion is
//! only applied when its generation is still the latest one, so a slow fetch
//! for an old location can never overwrite a newer source.

use crate::buffer::{BufferRegistry, BufferUrl};
use crate::error::{Result, SourceError};
use crate::fetch::Fetcher;
use crate::location::SourceLocation;
use bytes::Bytes;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something the playback layer can open without further I/O over the network.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayableSource {
    /// Local asset path
    File(PathBuf),

    /// Inline `data:` reference, decoded by the backend
    Data(String),

    /// Sound compiled into the player
    Builtin(String),

    /// Fetched bytes, reachable under `url` until it is revoked
    Buffer { url: BufferUrl, bytes: Bytes },
}

impl PlayableSource {
    /// Temporary buffer backing this source, if any.
    pub fn buffer_url(&self) -> Option<&BufferUrl> {
        match self {
            PlayableSource::Buffer { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// A location that has been materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    /// Location string exactly as configured
    pub location: String,

    /// Generation of the request that produced this source
    pub generation: u64,

    /// What to hand to the audio backend
    pub playable: PlayableSource,
}

/// Ticket for an accepted resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    generation: u64,
    location: String,
    parsed: SourceLocation,
}

impl ResolveRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_remote(&self) -> bool {
        self.parsed.is_remote()
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Source is ready and is now the current one
    Ready(ResolvedSource),

    /// Location equals the most recent request; nothing was loaded
    Unchanged,

    /// A newer request arrived while this one was in flight; result discarded
    Superseded,
}

#[derive(Debug, Default)]
struct ResolverState {
    generation: u64,
    requested: Option<String>,
    current: Option<ResolvedSource>,
    torn_down: bool,
}

/// Resolves sound locations, deduplicating repeats and discarding stale results.
pub struct AudioSourceResolver {
    fetcher: Arc<dyn Fetcher>,
    registry: BufferRegistry,
    state: Mutex<ResolverState>,
}

impl AudioSourceResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_registry(fetcher, BufferRegistry::new())
    }

    /// Create a resolver that registers fetched buffers in `registry`.
    pub fn with_registry(fetcher: Arc<dyn Fetcher>, registry: BufferRegistry) -> Self {
        Self {
            fetcher,
            registry,
            state: Mutex::new(ResolverState::default()),
        }
    }

    /// Registry holding fetched buffers.
    pub fn registry(&self) -> &BufferRegistry {
        &self.registry
    }

    /// Latest generation handed out.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Whether `generation` is still the latest request.
    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        !state.torn_down && state.generation == generation
    }

    /// Source produced by the latest completed request.
    pub fn current(&self) -> Option<ResolvedSource> {
        self.state.lock().current.clone()
    }

    /// Location of the most recent request, loaded or still in flight.
    pub fn requested(&self) -> Option<String> {
        self.state.lock().requested.clone()
    }

    /// Accept a request for `location`.
    ///
    /// Returns `Ok(None)` when `location` equals the most recent request. Otherwise
    /// the previous source is superseded: its buffer is revoked and any in-flight
    /// completion for it will be discarded.
    pub fn request(&self, location: &str) -> Result<Option<ResolveRequest>> {
        let mut state = self.state.lock();
        if state.torn_down {
            return Err(SourceError::TornDown);
        }

        if state.requested.as_deref() == Some(location) {
            return Ok(None);
        }

        state.generation += 1;
        state.requested = Some(location.to_string());
        if let Some(previous) = state.current.take() {
            self.release(&previous);
        }

        let generation = state.generation;
        drop(state);

        let parsed = SourceLocation::parse(location)?;
        debug!(location = %parsed, generation, "Accepted sound source request");

        Ok(Some(ResolveRequest {
            generation,
            location: location.to_string(),
            parsed,
        }))
    }

    /// Materialize an accepted request.
    ///
    /// Remote locations are fetched in full. A fetch failure for the latest
    /// request is returned to the caller and the location is forgotten so the
    /// same location can be retried; failures of superseded requests are dropped.
    pub async fn materialize(&self, request: ResolveRequest) -> Result<Resolution> {
        let playable = match &request.parsed {
            SourceLocation::Remote(url) => match self.fetcher.fetch(url).await {
                Ok(bytes) => {
                    let url = self.registry.register(bytes.clone());
                    PlayableSource::Buffer { url, bytes }
                }
                Err(e) => {
                    let mut state = self.state.lock();
                    if state.torn_down || state.generation != request.generation {
                        debug!(
                            location = %request.location,
                            generation = request.generation,
                            "Discarding failure of superseded request"
                        );
                        return Ok(Resolution::Superseded);
                    }
                    state.requested = None;
                    return Err(e);
                }
            },
            SourceLocation::Data(data) => PlayableSource::Data(data.clone()),
            SourceLocation::Builtin(name) => PlayableSource::Builtin(name.clone()),
            SourceLocation::File(path) => PlayableSource::File(path.clone()),
        };

        let mut state = self.state.lock();
        if state.torn_down || state.generation != request.generation {
            if let Some(url) = playable.buffer_url() {
                self.registry.revoke(url);
            }
            debug!(
                location = %request.location,
                generation = request.generation,
                latest = state.generation,
                "Discarding superseded sound source"
            );
            return Ok(Resolution::Superseded);
        }

        let resolved = ResolvedSource {
            location: request.location,
            generation: request.generation,
            playable,
        };
        state.current = Some(resolved.clone());

        info!(location = %request.parsed, generation = resolved.generation, "Sound source ready");
        Ok(Resolution::Ready(resolved))
    }

    /// Request and materialize in one step.
    pub async fn resolve(&self, location: &str) -> Result<Resolution> {
        match self.request(location)? {
            Some(request) => self.materialize(request).await,
            None => Ok(Resolution::Unchanged),
        }
    }

    /// Give up on a ready source the caller could not use.
    ///
    /// Only acts when `generation` is still the latest request: its buffer is
    /// revoked and the location is forgotten so the same location can be
    /// requested again. Returns whether anything was abandoned.
    pub fn abandon(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.torn_down || state.generation != generation {
            return false;
        }

        state.requested = None;
        if let Some(current) = state.current.take() {
            debug!(location = %current.location, generation, "Abandoning sound source");
            self.release(&current);
        }
        true
    }

    /// Release every buffer and reject further requests.
    ///
    /// In-flight requests complete as [`Resolution::Superseded`].
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        state.generation += 1;
        state.requested = None;
        if let Some(previous) = state.current.take() {
            self.release(&previous);
        }
        debug!("Sound source resolver torn down");
    }

    fn release(&self, source: &ResolvedSource) {
        if let Some(url) = source.playable.buffer_url() {
            if !self.registry.revoke(url) {
                warn!(buffer = %url, "Buffer was already revoked");
            }
        }
    }
}

impl Drop for AudioSourceResolver {
    fn drop(&mut self) {
        self.teardown();
    }
}
