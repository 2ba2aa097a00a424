//! Persistence layer.
//!
//! Saves and loads the player balance to/from a JSON file. The balance
//! is the only state that outlives rounds; one profile per player id is
//! the single source of truth — there is no secondary denormalized
//! record to keep in sync.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default balance file path.
const DEFAULT_STATE_FILE: &str = "apogee_state.json";

/// Persisted per-player profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub balance: u64,
}

/// External balance authority the engine writes settled balances
/// through. Synchronous in spirit: the engine awaits the write and
/// treats the stored value as authoritative on the next start.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Load the persisted balance, or `None` for a fresh player.
    async fn load_balance(&self, player_id: &str) -> Result<Option<u64>>;
    /// Persist the player's balance.
    async fn save_balance(&self, player_id: &str, balance: u64) -> Result<()>;
}

/// JSON-file implementation of [`BalanceStore`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: String,
}

impl JsonFileStore {
    /// Create a store at the given path, or the built-in default.
    pub fn new(path: Option<&str>) -> Self {
        Self {
            path: path.unwrap_or(DEFAULT_STATE_FILE).to_string(),
        }
    }

    /// Delete the state file (for testing or reset).
    pub fn delete(&self) -> Result<()> {
        if Path::new(&self.path).exists() {
            std::fs::remove_file(&self.path)
                .context(format!("Failed to delete state file {}", self.path))?;
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for JsonFileStore {
    async fn load_balance(&self, player_id: &str) -> Result<Option<u64>> {
        if !Path::new(&self.path).exists() {
            info!(path = %self.path, "No saved profile found, starting fresh");
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)
            .context(format!("Failed to read profile from {}", self.path))?;
        let profile: PlayerProfile = serde_json::from_str(&json)
            .context(format!("Failed to parse profile from {}", self.path))?;

        if profile.player_id != player_id {
            info!(
                path = %self.path,
                stored = %profile.player_id,
                requested = player_id,
                "Stored profile belongs to another player, starting fresh"
            );
            return Ok(None);
        }

        info!(
            path = %self.path,
            balance = profile.balance,
            "Profile loaded from disk"
        );
        Ok(Some(profile.balance))
    }

    async fn save_balance(&self, player_id: &str, balance: u64) -> Result<()> {
        let profile = PlayerProfile {
            player_id: player_id.to_string(),
            balance,
        };
        let json = serde_json::to_string_pretty(&profile)
            .context("Failed to serialise player profile")?;

        std::fs::write(&self.path, &json)
            .context(format!("Failed to write profile to {}", self.path))?;

        debug!(path = %self.path, balance, "Profile saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
