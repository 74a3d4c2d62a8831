//! Integration tests for the playback controller
//!
//! Drive the controller the way a panel update loop does and check what it
//! asks of the audio backend.

mod common;

use bytes::Bytes;
use common::{fixture, settle, wait_for, wait_playing, wait_ready};
use klaxon_playback::testing::HandleCall;
use klaxon_playback::{ControllerEvent, ControllerState, HandleEvent, PlaybackConfiguration};

const CHIME: &str = "builtin:flip-flap";
const SIREN: &str = "sounds/siren.wav";

fn config(location: &str) -> PlaybackConfiguration {
    PlaybackConfiguration::new(location, 1.0, false, 0.0)
}

// ===== Initialization =====

#[tokio::test]
async fn configure_installs_handle_with_retained_settings() {
    let mut f = fixture();
    assert_eq!(f.controller.state(), ControllerState::Uninitialized);

    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 0.4, true, 1.5));
    wait_ready(&mut f.events, CHIME).await;

    assert_eq!(f.controller.state(), ControllerState::Ready);
    assert_eq!(f.controller.loaded_location().as_deref(), Some(CHIME));

    let calls: Vec<HandleCall> = f.backend.calls().into_iter().map(|(_, c)| c).collect();
    assert_eq!(
        calls,
        vec![
            HandleCall::Open {
                location: CHIME.into()
            },
            HandleCall::SetLooping(true),
            HandleCall::SetVolume(0.4),
            HandleCall::SetPosition(1.5),
        ]
    );
}

#[tokio::test]
async fn settings_changed_while_loading_reach_the_new_handle() {
    let mut f = fixture();

    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 0.3, false, 0.0));
    // Still loading: nothing has run yet on this single-threaded runtime
    f.controller.set_volume(0.7);
    f.controller.set_looping(true);
    f.controller.seek(4.0);

    wait_ready(&mut f.events, CHIME).await;

    assert_eq!(f.backend.count(&HandleCall::SetVolume(0.7)), 1);
    assert_eq!(f.backend.count(&HandleCall::SetVolume(0.3)), 0);
    assert_eq!(f.backend.count(&HandleCall::SetLooping(true)), 1);
    assert_eq!(f.backend.count(&HandleCall::SetPosition(4.0)), 1);
}

#[tokio::test]
async fn operations_before_ready_are_safe_no_ops() {
    let mut f = fixture();

    // Nothing configured at all
    f.controller.play();
    f.controller.stop();
    f.controller.seek(3.0);
    f.controller.set_volume(0.5);
    assert!(f.backend.calls().is_empty());

    // Configured but not loaded yet
    f.controller.configure(config(CHIME));
    f.controller.play();
    wait_ready(&mut f.events, CHIME).await;

    assert_eq!(f.backend.starts(), 0);
    assert!(!f.controller.is_playing());
}

#[tokio::test]
async fn repeated_location_loads_once() {
    let mut f = fixture();

    for _ in 0..5 {
        f.controller.configure(config(CHIME));
    }
    wait_ready(&mut f.events, CHIME).await;
    for _ in 0..5 {
        f.controller.configure(config(CHIME));
    }
    settle().await;

    assert_eq!(f.backend.opened(), vec![CHIME.to_string()]);
}

// ===== Play / stop =====

#[tokio::test]
async fn play_twice_starts_once() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.play();
    f.controller.play();
    wait_playing(&mut f.events, true).await;
    f.controller.play();

    assert_eq!(f.backend.starts(), 1);
    assert!(f.controller.is_playing());
    assert_eq!(f.controller.state(), ControllerState::Playing);
}

#[tokio::test]
async fn stop_rewinds_to_start_offset() {
    let mut f = fixture();
    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 1.0, true, 2.5));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.play();
    wait_playing(&mut f.events, true).await;
    f.controller.stop();
    wait_playing(&mut f.events, false).await;

    let calls: Vec<HandleCall> = f.backend.calls().into_iter().map(|(_, c)| c).collect();
    let tail = &calls[calls.len() - 2..];
    assert_eq!(tail, &[HandleCall::Pause, HandleCall::SetPosition(2.5)]);
    assert!(!f.controller.is_playing());
    assert_eq!(f.controller.state(), ControllerState::Ready);
}

#[tokio::test]
async fn stop_when_stopped_is_a_no_op() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.stop();
    f.controller.stop();

    assert_eq!(f.backend.count(&HandleCall::Pause), 0);
}

#[tokio::test]
async fn stop_then_play_restarts() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.play();
    wait_playing(&mut f.events, true).await;

    // Play immediately after stop, before the pause is reported
    f.controller.stop();
    f.controller.play();
    wait_playing(&mut f.events, false).await;
    wait_playing(&mut f.events, true).await;

    assert_eq!(f.backend.starts(), 2);
    assert!(f.controller.is_playing());
}

#[tokio::test]
async fn natural_end_clears_playing() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.play();
    wait_playing(&mut f.events, true).await;
    f.backend.finish_playback();
    wait_playing(&mut f.events, false).await;

    f.controller.play();
    wait_playing(&mut f.events, true).await;
    assert_eq!(f.backend.starts(), 2);
}

// ===== Start failures =====

#[tokio::test]
async fn rejected_start_is_reported_not_thrown() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.backend.reject_starts("autoplay blocked");
    f.controller.play();

    let event = wait_for(&mut f.events, |e| matches!(e, ControllerEvent::Error { .. })).await;
    let ControllerEvent::Error { message } = event else {
        unreachable!()
    };
    assert!(message.contains("autoplay blocked"));
    assert!(!f.controller.is_playing());

    // Next cycle may try again
    f.backend.reset_behaviour();
    f.controller.play();
    wait_playing(&mut f.events, true).await;
    assert_eq!(f.backend.starts(), 2);
}

#[tokio::test]
async fn late_start_failure_never_reports_playing() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.backend.fail_starts_later("NotAllowedError");
    f.controller.play();
    wait_for(&mut f.events, |e| matches!(e, ControllerEvent::Error { .. })).await;

    assert!(!f.controller.is_playing());
    assert_eq!(f.controller.state(), ControllerState::Ready);

    // Pending start was cleared, so another attempt is made
    f.controller.play();
    assert_eq!(f.backend.starts(), 2);
}

// ===== Source changes =====

#[tokio::test]
async fn source_change_releases_old_handle() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;
    f.controller.play();
    wait_playing(&mut f.events, true).await;

    f.controller.configure(config(SIREN));
    assert_eq!(f.controller.state(), ControllerState::Uninitialized);
    assert!(!f.controller.is_playing());
    assert_eq!(f.backend.count(&HandleCall::Release), 1);

    wait_ready(&mut f.events, SIREN).await;
    assert_eq!(f.controller.loaded_location().as_deref(), Some(SIREN));
    assert_eq!(f.backend.opened(), vec![CHIME.to_string(), SIREN.to_string()]);
}

#[tokio::test]
async fn superseded_remote_source_never_installs() {
    let mut f = fixture();
    let release_a = f.fetcher.gate("http://a.test/a.mp3");
    let release_b = f.fetcher.gate("http://b.test/b.mp3");

    f.controller.configure(config("http://a.test/a.mp3"));
    f.controller.configure(config("http://b.test/b.mp3"));
    settle().await;

    release_b.send(Ok(Bytes::from_static(b"B"))).unwrap();
    wait_ready(&mut f.events, "http://b.test/b.mp3").await;
    release_a.send(Ok(Bytes::from_static(b"A"))).unwrap();
    settle().await;

    assert_eq!(
        f.controller.loaded_location().as_deref(),
        Some("http://b.test/b.mp3")
    );
    assert_eq!(f.backend.opened(), vec!["http://b.test/b.mp3".to_string()]);
    // Only B's buffer is alive
    assert_eq!(f.buffers.live_count(), 1);
}

#[tokio::test]
async fn fetch_failure_is_reported_with_status() {
    let mut f = fixture();
    let release = f.fetcher.gate("http://a.test/missing.mp3");

    f.controller.configure(config("http://a.test/missing.mp3"));
    release.send(Err(404)).unwrap();

    let event = wait_for(&mut f.events, |e| {
        matches!(e, ControllerEvent::SourceFailed { .. })
    })
    .await;
    assert!(matches!(
        event,
        ControllerEvent::SourceFailed {
            status: Some(404),
            ..
        }
    ));

    f.controller.play();
    assert_eq!(f.backend.starts(), 0);
    assert_eq!(f.controller.state(), ControllerState::Uninitialized);
}

#[tokio::test]
async fn backend_open_failure_is_reported() {
    let mut f = fixture();
    f.backend.fail_opens("unsupported format");

    f.controller.configure(config(SIREN));
    let event = wait_for(&mut f.events, |e| {
        matches!(e, ControllerEvent::SourceFailed { .. })
    })
    .await;
    let ControllerEvent::SourceFailed { message, status, .. } = event else {
        unreachable!()
    };
    assert!(message.contains("unsupported format"));
    assert_eq!(status, None);
    assert_eq!(f.controller.state(), ControllerState::Uninitialized);
}

#[tokio::test]
async fn backend_open_failure_releases_buffer_and_allows_retry() {
    let mut f = fixture();
    let url = "http://a.test/a.mp3";
    f.backend.fail_opens("device busy");

    let release = f.fetcher.gate(url);
    f.controller.configure(config(url));
    release.send(Ok(Bytes::from_static(b"A"))).unwrap();
    wait_for(&mut f.events, |e| {
        matches!(e, ControllerEvent::SourceFailed { .. })
    })
    .await;
    assert_eq!(f.buffers.live_count(), 0);

    // Same location loads again once the device is available
    f.backend.reset_behaviour();
    let release = f.fetcher.gate(url);
    f.controller.configure(config(url));
    release.send(Ok(Bytes::from_static(b"A"))).unwrap();
    wait_ready(&mut f.events, url).await;

    assert_eq!(f.backend.opened(), vec![url.to_string(), url.to_string()]);
    assert_eq!(f.controller.loaded_location().as_deref(), Some(url));
    assert_eq!(f.buffers.live_count(), 1);
}

#[tokio::test]
async fn events_from_replaced_handle_are_ignored() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;
    let old_generation = f.backend.calls()[0].0;

    f.controller.configure(config(SIREN));
    wait_ready(&mut f.events, SIREN).await;

    f.backend.emit(old_generation, HandleEvent::Playing);
    settle().await;
    assert!(!f.controller.is_playing());
}

// ===== Live settings =====

#[tokio::test]
async fn only_changed_settings_are_reapplied() {
    let mut f = fixture();
    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 0.5, false, 0.0));
    wait_ready(&mut f.events, CHIME).await;

    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 0.5, false, 0.0));
    f.controller
        .configure(PlaybackConfiguration::new(CHIME, 0.9, true, 0.0));

    assert_eq!(f.backend.count(&HandleCall::SetVolume(0.5)), 1);
    assert_eq!(f.backend.count(&HandleCall::SetVolume(0.9)), 1);
    assert_eq!(f.backend.count(&HandleCall::SetLooping(true)), 1);
    assert_eq!(f.backend.count(&HandleCall::SetPosition(0.0)), 1);
}

#[tokio::test]
async fn seek_clamps_and_is_retained() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.seek(-7.0);
    assert_eq!(f.controller.configuration().start_offset(), 0.0);
    f.controller.seek(12.5);
    assert_eq!(f.controller.configuration().start_offset(), 12.5);

    let positions: Vec<f64> = f
        .backend
        .calls()
        .into_iter()
        .filter_map(|(_, c)| match c {
            HandleCall::SetPosition(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(positions, vec![0.0, 0.0, 12.5]);
}

#[tokio::test]
async fn volume_setter_clamps() {
    let mut f = fixture();
    f.controller.configure(config(CHIME));
    wait_ready(&mut f.events, CHIME).await;

    f.controller.set_volume(3.0);
    f.controller.set_volume(-1.0);

    assert_eq!(f.controller.configuration().volume(), 0.0);
    // 1.0 once on install, once for the clamped 3.0
    assert_eq!(f.backend.count(&HandleCall::SetVolume(1.0)), 2);
    assert_eq!(f.backend.count(&HandleCall::SetVolume(0.0)), 1);
}

// ===== Disposal =====

#[tokio::test]
async fn dispose_releases_everything_and_absorbs_calls() {
    let mut f = fixture();
    let release = f.fetcher.gate("http://a.test/a.mp3");
    release.send(Ok(Bytes::from_static(b"A"))).unwrap();

    f.controller.configure(config("http://a.test/a.mp3"));
    wait_ready(&mut f.events, "http://a.test/a.mp3").await;
    f.controller.play();
    wait_playing(&mut f.events, true).await;
    assert_eq!(f.buffers.live_count(), 1);

    f.controller.dispose();
    wait_for(&mut f.events, |e| matches!(e, ControllerEvent::Disposed)).await;

    assert_eq!(f.controller.state(), ControllerState::Disposed);
    assert!(!f.controller.is_playing());
    assert_eq!(f.buffers.live_count(), 0);
    assert_eq!(f.backend.count(&HandleCall::Release), 1);

    let calls_before = f.backend.calls().len();
    f.controller.play();
    f.controller.stop();
    f.controller.seek(1.0);
    f.controller.set_volume(0.2);
    f.controller.configure(config(SIREN));
    f.controller.dispose();
    settle().await;

    assert_eq!(f.backend.calls().len(), calls_before);
    assert_eq!(f.controller.state(), ControllerState::Disposed);
}

#[tokio::test]
async fn dispose_while_loading_discards_the_result() {
    let f = fixture();
    let release = f.fetcher.gate("http://a.test/a.mp3");

    f.controller.configure(config("http://a.test/a.mp3"));
    settle().await;
    f.controller.dispose();
    release.send(Ok(Bytes::from_static(b"A"))).unwrap();
    settle().await;

    assert!(f.backend.opened().is_empty());
    assert_eq!(f.buffers.live_count(), 0);
}
