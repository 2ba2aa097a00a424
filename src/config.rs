//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! All game pacing (tick interval, reset delays) and limits (minimum
//! bet, history capacity) come from here so tests can shrink them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub game: GameConfig,
    pub player: PlayerConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
}

/// Round pacing and wagering limits.
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Multiplier advancement interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Smallest stake the engine accepts.
    pub minimum_bet: u64,
    /// Balance granted to a player with no persisted profile.
    pub initial_balance: u64,
    /// Number of completed rounds kept in history.
    pub history_capacity: usize,
    /// Delay before the table resets after a cashed-out round, in seconds.
    pub cashout_reset_secs: u64,
    /// Delay before the table resets after a losing crash, in seconds.
    pub crash_reset_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            minimum_bet: 10,
            initial_balance: 10_000,
            history_capacity: 10,
            cashout_reset_secs: 2,
            crash_reset_secs: 3,
        }
    }
}

impl GameConfig {
    /// Reset delay after a cashed-out round, in whole ticks.
    pub fn cashout_reset_ticks(&self) -> u64 {
        (self.cashout_reset_secs * 1000).div_ceil(self.tick_interval_ms.max(1))
    }

    /// Reset delay after a losing crash, in whole ticks.
    pub fn crash_reset_ticks(&self) -> u64 {
        (self.crash_reset_secs * 1000).div_ceil(self.tick_interval_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlayerConfig {
    /// Identity the balance is persisted under.
    pub id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON balance file. Optional; the store falls back to
    /// its built-in default when absent.
    #[serde(default)]
    pub state_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}
