//! APOGEE — Crash-Round Wagering Game Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the player balance from disk (or grants the fresh-start
//! balance), spawns the round engine and dashboard, and logs engine
//! events until shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use apogee::config;
use apogee::dashboard;
use apogee::engine::GameEngine;
use apogee::rng::ThreadRngSource;
use apogee::storage::{BalanceStore, JsonFileStore};
use apogee::types::GameEvent;

const BANNER: &str = r#"
    _    ____   ___   ____ _____ _____
   / \  |  _ \ / _ \ / ___| ____| ____|
  / _ \ | |_) | | | | |  _|  _| |  _|
 / ___ \|  __/| |_| | |_| | |___| |___
/_/   \_\_|    \___/ \____|_____|_____|

  Authoritative Payout & Game-round Engine
  v0.1.0 — Crash Table
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        player = %cfg.player.id,
        tick_interval_ms = cfg.game.tick_interval_ms,
        minimum_bet = cfg.game.minimum_bet,
        "APOGEE starting up"
    );

    // -- Restore or create the player balance ------------------------------

    let store = Arc::new(JsonFileStore::new(cfg.storage.state_file.as_deref()));

    let balance = match store.load_balance(&cfg.player.id).await? {
        Some(balance) => {
            info!(balance, "Resumed persisted balance");
            balance
        }
        None => {
            let balance = cfg.game.initial_balance;
            info!(balance, "Fresh start");
            balance
        }
    };

    // -- Spawn the engine and the dashboard --------------------------------

    let engine = Arc::new(GameEngine::spawn(
        cfg.game.clone(),
        cfg.player.id.clone(),
        balance,
        Box::new(ThreadRngSource),
        store.clone() as Arc<dyn BalanceStore>,
    ));

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(Arc::clone(&engine), cfg.dashboard.port)?;
    }

    // -- Event loop --------------------------------------------------------

    let mut events = engine.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Engine running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => log_event(&event),
                    // Lagged receivers miss ticks, never settlements we
                    // can't re-read from a snapshot; keep going.
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Stop the tick task before the final save so no settlement races it.
    engine.shutdown().await;

    let snapshot = engine.snapshot().await;
    store.save_balance(&cfg.player.id, snapshot.balance).await?;
    info!(
        balance = snapshot.balance,
        rounds_recorded = engine.history().await.len(),
        "APOGEE shut down cleanly."
    );

    Ok(())
}

/// Log one engine event; per-tick updates go to debug to keep info logs
/// readable at a 100 ms tick.
fn log_event(event: &GameEvent) {
    match event {
        GameEvent::MultiplierTick { multiplier } => {
            tracing::debug!(multiplier = format!("{multiplier:.2}"), "Tick");
        }
        other => info!(event = %other, "Engine event"),
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("apogee=info"));

    let json_logging = std::env::var("APOGEE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
