mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod focus;
mod mpv;
mod theme;
mod widgets;

use std::time::Duration;

use deck_core::browser::StationBrowser;
use deck_core::favorites::FavoritesStore;
use deck_core::state::StateStore;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = deck_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tunedeck.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tunedeck log: {}", log_path.display());
    tracing::info!("tunedeck starting…");

    // ── Load config and persisted state ──────────────────────────────────────
    let config = deck_core::config::Config::load().unwrap_or_default();
    let state_store = StateStore::new(config.paths.state_file.clone());
    let persisted = state_store.load(config.mpv.default_volume);
    let browser = StationBrowser::new(FavoritesStore::open(config.paths.favorites_file.clone()));

    // ── Audio element ────────────────────────────────────────────────────────
    let (core_tx, core_rx) = mpsc::channel::<core::CoreEvent>(1024);
    let (element_tx, element_rx) = mpsc::channel(256);
    let audio = core::AudioCore::new(
        persisted.volume,
        Duration::from_secs(config.mpv.connect_timeout_secs),
        core_tx.clone(),
        element_tx,
    );
    let audio_task = tokio::spawn(async move {
        if let Err(e) = audio.run(core_rx).await {
            tracing::error!("AudioCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(config, browser, persisted, state_store, core_tx)?;
    app.run(element_rx).await?;

    // App dropped its sender: the core stops mpv and exits.
    if tokio::time::timeout(Duration::from_secs(3), audio_task).await.is_err() {
        tracing::warn!("AudioCore did not shut down in time");
    }
    Ok(())
}
