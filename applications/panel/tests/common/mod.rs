//! Shared helpers for panel tests

#![allow(dead_code)]

use klaxon_panel::{AlertPanel, MuteCapability, PanelData, Series, DEFAULT_SOUND};
use klaxon_playback::testing::RecordingBackend;
use klaxon_playback::{ControllerEvent, PlaybackController};
use klaxon_source::{AudioSourceResolver, HttpFetcher};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct Fixture {
    pub panel: AlertPanel,
    pub backend: RecordingBackend,
    pub events: broadcast::Receiver<ControllerEvent>,
}

pub fn fixture(mute: MuteCapability) -> Fixture {
    let backend = RecordingBackend::new();
    let resolver = AudioSourceResolver::new(Arc::new(HttpFetcher::new().unwrap()));
    let controller = PlaybackController::new(Arc::new(backend.clone()), resolver).unwrap();
    let events = controller.subscribe();

    Fixture {
        panel: AlertPanel::new(controller, mute, DEFAULT_SOUND),
        backend,
        events,
    }
}

/// One series with three rows
pub fn firing() -> PanelData {
    PanelData::new(vec![Series::new(
        "alerts",
        vec![json!({"tenant": "a"}), json!({"tenant": "b"}), json!({"tenant": "c"})],
    )])
}

/// One series without rows
pub fn quiet() -> PanelData {
    PanelData::new(vec![Series::new("alerts", vec![])])
}

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

/// Let spawned tasks and handle notifications run without advancing time.
pub async fn drain() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
