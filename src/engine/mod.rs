//! Core engine — the table state machine and its tick driver.
//!
//! `Table` owns the complete mutable game state (round slot, bet slot,
//! balance, history, RNG) and settles every round exactly once.
//! `GameEngine` puts it behind a single `tokio::sync::Mutex` and
//! drives it from one background tick task, so multiplier advancement,
//! crash settlement, and bet commands can never interleave: whichever
//! acquires the lock first wins, and a crash transition observed by the
//! tick is final before any later cash-out can run.

pub mod history;
pub mod ledger;
pub mod round;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::GameConfig;
use crate::rng::RandomSource;
use crate::storage::BalanceStore;
use crate::types::{
    BetState, CashOutReceipt, GameError, GameEvent, HistoryEntry, RoundState, TableSnapshot,
};

use history::RoundHistory;
use ledger::Ledger;
use round::{Round, TickOutcome};

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The single table: one round slot, one bet slot, one balance.
///
/// All methods are synchronous and fast; timing lives entirely in the
/// caller. `tick` is the only method that advances time-dependent state.
pub struct Table {
    cfg: GameConfig,
    rng: Box<dyn RandomSource>,
    next_round_id: u64,
    round: Option<Round>,
    /// Ticks left in the post-crash display window; `Some` only while
    /// the round slot holds a crashed round.
    reset_in_ticks: Option<u64>,
    ledger: Ledger,
    history: RoundHistory,
}

impl Table {
    pub fn new(cfg: GameConfig, balance: u64, rng: Box<dyn RandomSource>) -> Self {
        Self {
            ledger: Ledger::new(balance, cfg.minimum_bet),
            history: RoundHistory::new(cfg.history_capacity),
            rng,
            next_round_id: 1,
            round: None,
            reset_in_ticks: None,
            cfg,
        }
    }

    /// Place a bet and start the round it is bound to.
    ///
    /// The stake debit, the bet arming, and the round start commit
    /// together; any rejection leaves the table untouched.
    pub fn place_bet(
        &mut self,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.ledger.bet_state().is_armed() {
            return Err(GameError::RoundInProgress);
        }
        if self.round.is_some() {
            // A settled round still on display; a new bet has to wait
            // for the reset.
            return Err(GameError::AlreadyRunning);
        }
        self.ledger.arm(amount)?;
        let id = self.next_round_id;
        self.next_round_id += 1;
        self.round = Some(Round::start(id, self.rng.as_mut(), now));
        Ok(vec![
            GameEvent::BetPlaced { amount },
            GameEvent::RoundStarted { round_id: id },
        ])
    }

    /// Cash out the armed bet at the round's current multiplier.
    pub fn cash_out(&mut self) -> Result<(CashOutReceipt, Vec<GameEvent>), GameError> {
        match self.ledger.bet_state() {
            BetState::None | BetState::CashedOut => Err(GameError::NoActiveBet),
            BetState::Armed | BetState::Lost => {
                let multiplier = match self.round.as_ref() {
                    Some(round) if round.is_running() => round.multiplier(),
                    // The crash transition already won this race (or no
                    // round ever started); it is authoritative.
                    _ => return Err(GameError::RoundNotRunning),
                };
                let payout = self.ledger.cash_out(multiplier)?;
                let receipt = CashOutReceipt {
                    payout,
                    multiplier,
                    balance: self.ledger.balance(),
                };
                Ok((
                    receipt,
                    vec![GameEvent::BetCashedOut {
                        payout,
                        multiplier,
                    }],
                ))
            }
        }
    }

    /// One timer tick: advance a running round, or count down the
    /// post-crash display window and reset when it expires.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<GameEvent> {
        if let Some(remaining) = self.reset_in_ticks {
            if remaining <= 1 {
                self.reset();
            } else {
                self.reset_in_ticks = Some(remaining - 1);
            }
            return Vec::new();
        }

        let Some(round) = self.round.as_mut() else {
            return Vec::new();
        };

        match round.tick() {
            TickOutcome::Advanced(multiplier) => {
                vec![GameEvent::MultiplierTick { multiplier }]
            }
            TickOutcome::Crashed(final_multiplier) => {
                let mut events = vec![GameEvent::RoundCrashed {
                    multiplier: final_multiplier,
                }];
                // Settlement and history happen in the same critical
                // section as the crash transition itself.
                let lost = self.ledger.settle_crash();
                self.history.record(final_multiplier, now);
                let cooldown = if let Some(amount) = lost {
                    events.push(GameEvent::BetLost { amount });
                    self.cfg.crash_reset_ticks()
                } else {
                    self.cfg.cashout_reset_ticks()
                };
                self.reset_in_ticks = Some(cooldown.max(1));
                events
            }
        }
    }

    fn reset(&mut self) {
        self.round = None;
        self.reset_in_ticks = None;
        self.ledger.clear();
    }

    /// Latest published multiplier; 1.00 when idle.
    pub fn multiplier(&self) -> f64 {
        self.round.as_ref().map_or(1.0, |r| r.multiplier())
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.list()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        let (round_state, round_id) = match self.round.as_ref() {
            None => (RoundState::Idle, None),
            Some(r) if r.is_running() => (RoundState::Running, Some(r.id())),
            Some(r) => (RoundState::Crashed, Some(r.id())),
        };
        let bet = self.ledger.bet();
        TableSnapshot {
            round_state,
            round_id,
            multiplier: self.multiplier(),
            bet_state: self.ledger.bet_state(),
            bet_amount: bet.map(|b| b.amount),
            cashout_multiplier: bet.and_then(|b| b.cashout_multiplier),
            balance: self.ledger.balance(),
        }
    }
}

// ---------------------------------------------------------------------------
// GameEngine
// ---------------------------------------------------------------------------

/// The running engine: the table behind its exclusive-access boundary,
/// the background tick task, the event channel, and balance
/// write-through to the store.
pub struct GameEngine {
    table: Arc<Mutex<Table>>,
    events: broadcast::Sender<GameEvent>,
    store: Arc<dyn BalanceStore>,
    player_id: String,
    shutdown_tx: watch::Sender<bool>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl GameEngine {
    /// Build the engine and spawn its tick task.
    pub fn spawn(
        cfg: GameConfig,
        player_id: String,
        balance: u64,
        rng: Box<dyn RandomSource>,
        store: Arc<dyn BalanceStore>,
    ) -> Self {
        let tick_interval = Duration::from_millis(cfg.tick_interval_ms.max(1));
        let table = Arc::new(Mutex::new(Table::new(cfg, balance, rng)));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let driver = tokio::spawn({
            let table = Arc::clone(&table);
            let events = events.clone();
            async move {
                let mut interval = tokio::time::interval(tick_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let mut table = table.lock().await;
                            for event in table.tick(Utc::now()) {
                                let _ = events.send(event);
                            }
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
                debug!("Tick task stopped");
            }
        });

        Self {
            table,
            events,
            store,
            player_id,
            shutdown_tx,
            driver: Mutex::new(Some(driver)),
        }
    }

    /// Place a bet; this also starts the round it is bound to.
    pub async fn place_bet(&self, amount: u64) -> Result<TableSnapshot, GameError> {
        let snapshot = {
            let mut table = self.table.lock().await;
            for event in table.place_bet(amount, Utc::now())? {
                let _ = self.events.send(event);
            }
            table.snapshot()
        };
        info!(amount, balance = snapshot.balance, "Bet placed");
        self.persist_balance(snapshot.balance).await;
        Ok(snapshot)
    }

    /// Cash out the armed bet at the current multiplier.
    pub async fn cash_out(&self) -> Result<CashOutReceipt, GameError> {
        let receipt = {
            let mut table = self.table.lock().await;
            let (receipt, events) = table.cash_out()?;
            for event in events {
                let _ = self.events.send(event);
            }
            receipt
        };
        info!(
            payout = receipt.payout,
            multiplier = format!("{:.2}", receipt.multiplier),
            balance = receipt.balance,
            "Cashed out"
        );
        self.persist_balance(receipt.balance).await;
        Ok(receipt)
    }

    pub async fn snapshot(&self) -> TableSnapshot {
        self.table.lock().await.snapshot()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.table.lock().await.history()
    }

    /// Subscribe to engine events. Slow receivers may observe lag, never
    /// reordering.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Stop the tick task and wait for it, so no settlement is left
    /// half-applied behind the lock.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.driver.lock().await.take() {
            let _ = handle.await;
        }
    }

    async fn persist_balance(&self, balance: u64) {
        if let Err(e) = self.store.save_balance(&self.player_id, balance).await {
            error!(error = %e, "Failed to persist balance");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
