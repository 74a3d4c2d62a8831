//! Environment overrides (own test binary: mutates process environment)

use klaxon_panel::HostConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("klaxon.toml");
    fs::write(&path, "[panel]\nvolume = 40\nenabled = false\n").unwrap();

    std::env::set_var("KLAXON_PANEL__VOLUME", "70");
    std::env::set_var("KLAXON_PANEL__ENABLED", "true");
    std::env::set_var("KLAXON_HOST__POLL_INTERVAL_MS", "500");

    let config = HostConfig::load(Some(&path)).unwrap();

    std::env::remove_var("KLAXON_PANEL__VOLUME");
    std::env::remove_var("KLAXON_PANEL__ENABLED");
    std::env::remove_var("KLAXON_HOST__POLL_INTERVAL_MS");

    assert_eq!(config.panel.volume, 70);
    assert!(config.panel.enabled);
    assert_eq!(config.host.poll_interval_ms, 500);
}
