//! Shared helpers for controller tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use klaxon_playback::testing::RecordingBackend;
use klaxon_playback::{ControllerEvent, PlaybackController};
use klaxon_source::{AudioSourceResolver, BufferRegistry, Fetcher, SourceError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use url::Url;

/// Fetcher whose completions are released manually, per URL.
#[derive(Default)]
pub struct GatedFetcher {
    gates: Mutex<HashMap<String, oneshot::Receiver<Result<Bytes, u16>>>>,
}

impl GatedFetcher {
    pub fn gate(&self, url: &str) -> oneshot::Sender<Result<Bytes, u16>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(url.to_string(), rx);
        tx
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, url: &Url) -> klaxon_source::Result<Bytes> {
        let rx = self
            .gates
            .lock()
            .remove(url.as_str())
            .expect("no gate registered for url");
        match rx.await.expect("gate dropped") {
            Ok(bytes) => Ok(bytes),
            Err(status) => Err(SourceError::Fetch { status }),
        }
    }
}

pub struct Fixture {
    pub controller: PlaybackController,
    pub backend: RecordingBackend,
    pub fetcher: Arc<GatedFetcher>,
    pub buffers: BufferRegistry,
    pub events: broadcast::Receiver<ControllerEvent>,
}

pub fn fixture() -> Fixture {
    let backend = RecordingBackend::new();
    let fetcher = Arc::new(GatedFetcher::default());
    let buffers = BufferRegistry::new();
    let resolver = AudioSourceResolver::with_registry(fetcher.clone(), buffers.clone());
    let controller = PlaybackController::new(Arc::new(backend.clone()), resolver).unwrap();
    let events = controller.subscribe();

    Fixture {
        controller,
        backend,
        fetcher,
        buffers,
        events,
    }
}

/// Wait for the first event matching `pred`, skipping others.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<ControllerEvent>, pred: F) -> ControllerEvent
where
    F: Fn(&ControllerEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for controller event")
}

pub async fn wait_ready(rx: &mut broadcast::Receiver<ControllerEvent>, location: &str) {
    wait_for(rx, |e| {
        matches!(e, ControllerEvent::SourceReady { location: l } if l == location)
    })
    .await;
}

pub async fn wait_playing(rx: &mut broadcast::Receiver<ControllerEvent>, playing: bool) {
    wait_for(rx, |e| {
        matches!(e, ControllerEvent::StateChanged { playing: p } if *p == playing)
    })
    .await;
}

/// Give background tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
