//! Player account-of-record
//!
//! Credits, win/loss counters, streaks, XP, and the badge set. Mutated
//! only by the prediction engine applying pure payout results; persisted
//! after every mutation.

mod store;

pub use store::LedgerStore;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The player's account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLedger {
    pub username: String,
    pub credits: Decimal,
    pub wins: u32,
    pub losses: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_xp: u32,
    /// Unlocked badge ids; grows only, entries unique
    pub badges: BTreeSet<String>,
}

impl PlayerLedger {
    /// Fresh ledger with the configured starting credits
    pub fn new(username: impl Into<String>, initial_credits: Decimal) -> Self {
        Self {
            username: username.into(),
            credits: initial_credits,
            wins: 0,
            losses: 0,
            current_streak: 0,
            best_streak: 0,
            total_xp: 0,
            badges: BTreeSet::new(),
        }
    }

    /// Leaderboard score: total experience points
    pub fn score(&self) -> u32 {
        self.total_xp
    }

    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.contains(id)
    }
}
