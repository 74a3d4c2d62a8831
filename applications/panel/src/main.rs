/// Klaxon Panel - alert sound panel runner
use anyhow::Context;
use clap::{Parser, Subcommand};
use klaxon_audio_desktop::CpalBackend;
use klaxon_panel::{
    options_schema, AlertPanel, HostConfig, PanelData, PanelView, TEST_SOUND_DURATION,
};
use klaxon_playback::{ControllerEvent, PlaybackController};
use klaxon_source::{AudioSourceResolver, HttpFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound for loading the sound before a test
const LOAD_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Parser)]
#[command(name = "klaxon-panel")]
#[command(about = "Plays an alert sound while dashboard data reports an alert", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a data file and play the alert sound while it reports an alert
    Run {
        /// Panel data JSON file (overrides host.data_path)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Play the configured sound for five seconds
    TestSound,
    /// Print the option editor schema as JSON
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "klaxon_panel=info,klaxon_playback=info,klaxon_source=info,klaxon_audio_desktop=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = HostConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Run { data } => run(config, data).await?,
        Commands::TestSound => test_sound(config).await?,
        Commands::Schema => {
            let schema = options_schema(&config.mute_capability());
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn build_panel(config: &HostConfig) -> anyhow::Result<AlertPanel> {
    let mut backend = CpalBackend::new().context("Failed to open audio output")?;
    if let Some(root) = &config.host.asset_root {
        backend = backend.with_asset_root(root.clone());
    }

    let resolver = AudioSourceResolver::new(Arc::new(HttpFetcher::new()?));
    let controller = PlaybackController::new(Arc::new(backend), resolver)?;

    Ok(AlertPanel::new(
        controller,
        config.mute_capability(),
        config.host.default_sound.clone(),
    ))
}

async fn run(config: HostConfig, data: Option<PathBuf>) -> anyhow::Result<()> {
    let data_path = data
        .or_else(|| config.host.data_path.clone())
        .context("No panel data file (pass --data or set host.data_path)")?;

    let mut panel = build_panel(&config)?;
    let mut events = panel.subscribe();
    let mut ticker = tokio::time::interval(config.poll_interval());
    let mut last_view: Option<PanelView> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("Watching {}", data_path.display());
    tracing::info!("Mute by variable: {}", config.mute_capability().is_enabled());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match PanelData::load(&data_path) {
                    Ok(data) => {
                        let view = panel.update(&config.panel, &data);
                        log_view_change(&mut last_view, view);
                    }
                    Err(e) => {
                        tracing::warn!(path = %data_path.display(), error = %e, "Failed to read panel data");
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(ControllerEvent::SourceReady { location }) => {
                        tracing::debug!(location = %location, "Sound loaded, re-evaluating");
                        if let Some(view) = panel.rerun() {
                            log_view_change(&mut last_view, view);
                        }
                    }
                    Ok(ControllerEvent::StateChanged { playing }) => {
                        tracing::info!(playing, "Alert sound state changed");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed controller events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    panel.dispose();
    Ok(())
}

fn log_view_change(last: &mut Option<PanelView>, view: PanelView) {
    if last.as_ref() != Some(&view) {
        tracing::info!(
            decision = ?view.decision,
            muted = view.muted,
            playing = view.playing,
            "Panel updated"
        );
        *last = Some(view);
    }
}

async fn test_sound(config: HostConfig) -> anyhow::Result<()> {
    let mut panel = build_panel(&config)?;
    let mut events = panel.subscribe();

    panel.apply_options(&config.panel);
    let location = config.panel.sound_location(&config.host.default_sound);
    tokio::time::timeout(LOAD_TIMEOUT, wait_until_loaded(&mut events))
        .await
        .with_context(|| format!("Timed out loading {location}"))??;

    let outcome = panel.test_sound(config.panel.enabled);
    if !outcome.started {
        tracing::info!("Sound is already playing");
    }

    tokio::time::sleep(TEST_SOUND_DURATION + Duration::from_millis(250)).await;
    panel.dispose();
    Ok(())
}

async fn wait_until_loaded(
    events: &mut broadcast::Receiver<ControllerEvent>,
) -> anyhow::Result<()> {
    loop {
        match events.recv().await {
            Ok(ControllerEvent::SourceReady { .. }) => return Ok(()),
            Ok(ControllerEvent::SourceFailed { location, message, .. }) => {
                anyhow::bail!("Failed to load {location}: {message}");
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => anyhow::bail!("Playback controller closed"),
        }
    }
}
