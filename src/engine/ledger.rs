//! Bet ledger — the single bet slot and the balance it settles against.
//!
//! Every mutation commits the (bet state, balance) pair as one unit:
//! a debit never happens without arming the bet, a credit never happens
//! without marking it cashed out, and a loss touches the bet state only
//! (the stake was already debited at placement).

use crate::types::{BetState, GameError};

/// A bet bound to the current round.
#[derive(Debug, Clone)]
pub struct Bet {
    pub amount: u64,
    pub state: BetState,
    /// Multiplier locked in by a cash-out; `None` until then.
    pub cashout_multiplier: Option<f64>,
}

/// Bet slot plus player balance.
#[derive(Debug, Clone)]
pub struct Ledger {
    balance: u64,
    minimum_bet: u64,
    bet: Option<Bet>,
}

impl Ledger {
    pub fn new(balance: u64, minimum_bet: u64) -> Self {
        Self {
            balance,
            minimum_bet,
            bet: None,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn bet(&self) -> Option<&Bet> {
        self.bet.as_ref()
    }

    /// State of the bet slot; `BetState::None` when empty.
    pub fn bet_state(&self) -> BetState {
        self.bet.as_ref().map_or(BetState::None, |b| b.state)
    }

    /// Validate and arm a bet: debit the stake and occupy the slot as
    /// one unit. The sufficiency check and the debit happen on the same
    /// balance read.
    pub fn arm(&mut self, amount: u64) -> Result<(), GameError> {
        if amount == 0 || amount < self.minimum_bet {
            return Err(GameError::InvalidAmount {
                amount,
                minimum: self.minimum_bet,
            });
        }
        if self.bet_state().is_armed() {
            return Err(GameError::RoundInProgress);
        }
        if amount > self.balance {
            return Err(GameError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        debug_assert!(self.bet.is_none(), "arming over a settled bet");
        self.balance -= amount;
        self.bet = Some(Bet {
            amount,
            state: BetState::Armed,
            cashout_multiplier: None,
        });
        Ok(())
    }

    /// Pay out the armed bet at the given multiplier: credit
    /// `floor(amount × multiplier)` and mark the bet cashed out.
    pub fn cash_out(&mut self, multiplier: f64) -> Result<u64, GameError> {
        let bet = self
            .bet
            .as_mut()
            .filter(|b| b.state.is_armed())
            .ok_or(GameError::NoActiveBet)?;
        let payout = payout(bet.amount, multiplier);
        bet.state = BetState::CashedOut;
        bet.cashout_multiplier = Some(multiplier);
        self.balance += payout;
        Ok(payout)
    }

    /// Crash settlement: an armed bet becomes lost, with no balance
    /// change. Returns the lost stake, or `None` if the bet had already
    /// been cashed out (or the slot is empty).
    pub fn settle_crash(&mut self) -> Option<u64> {
        match self.bet.as_mut() {
            Some(bet) if bet.state.is_armed() => {
                bet.state = BetState::Lost;
                Some(bet.amount)
            }
            _ => None,
        }
    }

    /// Clear the slot at table reset.
    pub fn clear(&mut self) {
        self.bet = None;
    }
}

/// Payout for a stake at a multiplier, floored to the smallest currency
/// unit.
pub fn payout(amount: u64, multiplier: f64) -> u64 {
    (amount as f64 * multiplier).floor() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
