mod action;
mod app;
mod app_state;
mod component;
mod components;
mod core;
mod log_layer;
mod mpv;
mod theme;
mod widgets;

use carousel_proto::config::Config;
use carousel_proto::protocol::PlayerState;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// What the PlayerCore broadcasts to the UI.
#[derive(Debug, Clone)]
pub enum CoreMessage {
    /// Fresh snapshot after any change.
    State(PlayerState),
    /// A WARN/ERROR line from the tracing layer.
    Log(String),
    /// The current load failed; `name` is the channel's display name.
    LoadFailed { name: String, reason: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    let log_path = config.paths.log_file.clone();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // ── Broadcast channel (PlayerCore → UI), also fed by the log layer ──────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<CoreMessage>(1024);

    // RUST_LOG overrides; HTTP client internals stay quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(log_layer::BroadcastLayer::new(broadcast_tx.clone()))
        .with(tracing_subscriber::EnvFilter::new(log_filter))
        .init();

    eprintln!("carousel log: {}", log_path.display());
    tracing::info!("carousel starting…");
    tracing::info!("Config: {:?}", Config::config_path());

    // ── CoreEvent channel (UI → PlayerCore) ──────────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::CoreEvent>(1024);

    let player_core = core::PlayerCore::new(&config, broadcast_tx.clone(), event_tx.clone());
    let saved = player_core.persisted();
    let initial = player_core.snapshot();

    let core_handle = tokio::spawn(async move {
        if let Err(e) = player_core.run(event_rx).await {
            tracing::error!("PlayerCore exited with error: {}", e);
        }
    });

    let app = app::App::new(&config, saved, initial, event_tx);
    let result = app.run(broadcast_rx).await;

    // the core stops mpv once it sees Shutdown
    let _ = tokio::time::timeout(std::time::Duration::from_secs(3), core_handle).await;
    result
}
