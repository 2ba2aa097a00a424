//! Round history — a bounded, newest-first log of final multipliers.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::types::HistoryEntry;

/// Bounded log of completed rounds. Recording evicts the oldest entry
/// once the configured capacity is reached.
#[derive(Debug, Clone)]
pub struct RoundHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RoundHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one completed round. Called exactly once per round,
    /// whatever the bet's outcome was.
    pub fn record(&mut self, multiplier: f64, at: DateTime<Utc>) {
        self.entries.push_front(HistoryEntry { multiplier, at });
        self.entries.truncate(self.capacity);
    }

    /// Fresh snapshot, newest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
