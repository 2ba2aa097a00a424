//! Shared types for the APOGEE engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that engine, storage, and
//! dashboard modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Round & bet state
// ---------------------------------------------------------------------------

/// Lifecycle state of the single table round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Idle,
    Running,
    Crashed,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundState::Idle => write!(f, "idle"),
            RoundState::Running => write!(f, "running"),
            RoundState::Crashed => write!(f, "crashed"),
        }
    }
}

/// Lifecycle state of the table's bet slot.
///
/// At most one bet exists at a time; it is created together with its
/// round and cleared when the table resets to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetState {
    None,
    Armed,
    CashedOut,
    Lost,
}

impl BetState {
    /// Whether the bet is still live and waiting on cash-out or crash.
    pub fn is_armed(&self) -> bool {
        *self == BetState::Armed
    }

    /// Whether the bet has reached a terminal outcome.
    pub fn is_settled(&self) -> bool {
        matches!(self, BetState::CashedOut | BetState::Lost)
    }
}

impl fmt::Display for BetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetState::None => write!(f, "none"),
            BetState::Armed => write!(f, "armed"),
            BetState::CashedOut => write!(f, "cashed_out"),
            BetState::Lost => write!(f, "lost"),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Final multiplier of one completed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The multiplier the round crashed at.
    pub multiplier: f64,
    /// When the round completed.
    pub at: DateTime<Utc>,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x @ {}", self.multiplier, self.at.format("%H:%M:%S"))
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only view of the table, taken under the engine lock.
///
/// This is what the dashboard serves and what tests assert against;
/// it never exposes the hidden crash point of a running round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub round_state: RoundState,
    /// Id of the current round, if one exists (running or crashed).
    pub round_id: Option<u64>,
    /// Latest published multiplier; 1.00 when idle.
    pub multiplier: f64,
    pub bet_state: BetState,
    /// Stake of the current bet, if any.
    pub bet_amount: Option<u64>,
    /// Multiplier locked in by a cash-out, if the bet was cashed out.
    pub cashout_multiplier: Option<f64>,
    pub balance: u64,
}

/// Result of a successful cash-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashOutReceipt {
    /// Credited amount: `floor(stake × multiplier)`.
    pub payout: u64,
    /// Multiplier read at the instant of the call.
    pub multiplier: f64,
    /// Balance after the credit.
    pub balance: u64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Discrete events published by the engine for external observers.
///
/// The engine formats no user-facing text; presentation layers subscribe
/// and render these however they like.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted { round_id: u64 },
    MultiplierTick { multiplier: f64 },
    RoundCrashed { multiplier: f64 },
    BetPlaced { amount: u64 },
    BetCashedOut { payout: u64, multiplier: f64 },
    BetLost { amount: u64 },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::RoundStarted { round_id } => write!(f, "round #{round_id} started"),
            GameEvent::MultiplierTick { multiplier } => write!(f, "tick {multiplier:.2}x"),
            GameEvent::RoundCrashed { multiplier } => write!(f, "crashed at {multiplier:.2}x"),
            GameEvent::BetPlaced { amount } => write!(f, "bet placed: {amount}"),
            GameEvent::BetCashedOut { payout, multiplier } => {
                write!(f, "cashed out {payout} at {multiplier:.2}x")
            }
            GameEvent::BetLost { amount } => write!(f, "bet lost: {amount}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for APOGEE.
///
/// All of these are local, synchronous, and recoverable by the caller;
/// none are fatal to the engine, and none leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid bet amount: {amount} (minimum {minimum})")]
    InvalidAmount { amount: u64, minimum: u64 },

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("A bet is already armed for this round")]
    RoundInProgress,

    #[error("A round is already running")]
    AlreadyRunning,

    #[error("No active bet to cash out")]
    NoActiveBet,

    #[error("Round is not running")]
    RoundNotRunning,
}

impl GameError {
    /// Short machine-readable kind, used by the dashboard error body.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidAmount { .. } => "invalid_amount",
            GameError::InsufficientBalance { .. } => "insufficient_balance",
            GameError::RoundInProgress => "round_in_progress",
            GameError::AlreadyRunning => "already_running",
            GameError::NoActiveBet => "no_active_bet",
            GameError::RoundNotRunning => "round_not_running",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- RoundState tests --

    #[test]
    fn test_round_state_display() {
        assert_eq!(format!("{}", RoundState::Idle), "idle");
        assert_eq!(format!("{}", RoundState::Running), "running");
        assert_eq!(format!("{}", RoundState::Crashed), "crashed");
    }

    #[test]
    fn test_round_state_serialization_roundtrip() {
        for state in [RoundState::Idle, RoundState::Running, RoundState::Crashed] {
            let json = serde_json::to_string(&state).unwrap();
            let parsed: RoundState = serde_json::from_str(&json).unwrap();
            assert_eq!(state, parsed);
        }
        assert_eq!(serde_json::to_string(&RoundState::Idle).unwrap(), "\"idle\"");
    }

    // -- BetState tests --

    #[test]
    fn test_bet_state_predicates() {
        assert!(BetState::Armed.is_armed());
        assert!(!BetState::None.is_armed());
        assert!(BetState::CashedOut.is_settled());
        assert!(BetState::Lost.is_settled());
        assert!(!BetState::Armed.is_settled());
        assert!(!BetState::None.is_settled());
    }

    #[test]
    fn test_bet_state_display() {
        assert_eq!(format!("{}", BetState::None), "none");
        assert_eq!(format!("{}", BetState::CashedOut), "cashed_out");
    }

    #[test]
    fn test_bet_state_serialization_roundtrip() {
        for state in [
            BetState::None,
            BetState::Armed,
            BetState::CashedOut,
            BetState::Lost,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            let parsed: BetState = serde_json::from_str(&json).unwrap();
            assert_eq!(state, parsed);
        }
    }

    // -- HistoryEntry tests --

    #[test]
    fn test_history_entry_display() {
        let entry = HistoryEntry {
            multiplier: 3.4,
            at: Utc::now(),
        };
        assert!(format!("{entry}").starts_with("3.40x"));
    }

    #[test]
    fn test_history_entry_serialization_roundtrip() {
        let entry = HistoryEntry {
            multiplier: 2.45,
            at: Utc::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert!((parsed.multiplier - 2.45).abs() < 1e-10);
    }

    // -- TableSnapshot tests --

    #[test]
    fn test_snapshot_serialization() {
        let snap = TableSnapshot {
            round_state: RoundState::Running,
            round_id: Some(7),
            multiplier: 1.85,
            bet_state: BetState::Armed,
            bet_amount: Some(100),
            cashout_multiplier: None,
            balance: 9900,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"running\""));
        assert!(json.contains("\"armed\""));
        let parsed: TableSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.round_id, Some(7));
        assert_eq!(parsed.balance, 9900);
    }

    #[test]
    fn test_cash_out_receipt_serialization_roundtrip() {
        let receipt = CashOutReceipt {
            payout: 200,
            multiplier: 2.0,
            balance: 10_100,
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let parsed: CashOutReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.payout, 200);
        assert_eq!(parsed.balance, 10_100);
    }

    // -- GameEvent tests --

    #[test]
    fn test_event_display() {
        let e = GameEvent::BetCashedOut {
            payout: 200,
            multiplier: 2.0,
        };
        assert_eq!(format!("{e}"), "cashed out 200 at 2.00x");

        let e = GameEvent::RoundStarted { round_id: 3 };
        assert_eq!(format!("{e}"), "round #3 started");
    }

    #[test]
    fn test_event_serialization_tagged() {
        let e = GameEvent::RoundCrashed { multiplier: 3.21 };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"event\":\"round_crashed\""));
        assert!(json.contains("3.21"));
    }

    // -- GameError tests --

    #[test]
    fn test_game_error_display() {
        let e = GameError::InsufficientBalance {
            needed: 20000,
            available: 10000,
        };
        assert_eq!(
            format!("{e}"),
            "Insufficient balance: need 20000, have 10000"
        );

        let e = GameError::InvalidAmount {
            amount: 5,
            minimum: 10,
        };
        assert!(format!("{e}").contains("5"));
        assert!(format!("{e}").contains("10"));
    }

    #[test]
    fn test_game_error_kind() {
        assert_eq!(GameError::NoActiveBet.kind(), "no_active_bet");
        assert_eq!(GameError::RoundNotRunning.kind(), "round_not_running");
        assert_eq!(GameError::AlreadyRunning.kind(), "already_running");
        assert_eq!(GameError::RoundInProgress.kind(), "round_in_progress");
    }
}
