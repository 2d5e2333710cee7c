//! Payout and progression computation
//!
//! Pure functions from a resolved rate move to credit delta, XP, and badge
//! unlocks. Nothing here touches a clock, the feed, or storage.

mod badges;

pub use badges::{evaluate_unlocks, BadgeId, BADGE_CATALOG};

use crate::ledger::PlayerLedger;
use crate::prediction::Direction;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Numeric result of a resolved prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the predicted direction matched the realized move
    pub correct: bool,
    /// Fractional rate change from start to resolution
    pub percent_move: f64,
    /// Signed credit change relative to placement: `+stake * multiplier`
    /// on a win, `-stake` on a loss. The stake is debited at placement, so
    /// applying a loss adds nothing further; the loss delta is reporting
    /// only.
    pub credit_delta: Decimal,
    /// Experience earned; applies on both win and loss
    pub xp: u32,
}

/// Compute the outcome for a resolved prediction.
///
/// Win multiplier is `1 + min(5, |move| * 10)`, capping the total payout at
/// 6x the stake. A move of exactly zero is incorrect for both directions.
/// XP is `floor(10 * sqrt(|move| * 100))`.
pub fn evaluate(direction: Direction, percent_move: f64, stake: Decimal) -> Outcome {
    let correct = match direction {
        Direction::Up => percent_move > 0.0,
        Direction::Down => percent_move < 0.0,
    };

    let credit_delta = if correct {
        let multiplier = 1.0 + f64::min(5.0, percent_move.abs() * 10.0);
        // Quantized to 6 dp before the stake multiply to keep f64 noise out
        // of the credit books
        let multiplier = Decimal::try_from(multiplier)
            .unwrap_or(Decimal::ONE)
            .round_dp(6);
        stake * multiplier
    } else {
        -stake
    };

    let xp = (10.0 * (percent_move.abs() * 100.0).sqrt()).floor() as u32;

    Outcome {
        correct,
        percent_move,
        credit_delta,
        xp,
    }
}

/// Apply an outcome to the ledger and return any newly unlocked badges,
/// in catalog check order.
///
/// Only a win credits the ledger: the stake left the books at placement,
/// so a loss is already paid for and changes no credits here. Credits are
/// rounded to 2 decimal places after every application using half-up
/// rounding (midpoint away from zero).
pub fn apply(ledger: &mut PlayerLedger, outcome: &Outcome) -> Vec<BadgeId> {
    if outcome.correct {
        ledger.credits += outcome.credit_delta;
    }
    ledger.credits = ledger
        .credits
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if outcome.correct {
        ledger.wins += 1;
        ledger.current_streak += 1;
        ledger.best_streak = ledger.best_streak.max(ledger.current_streak);
    } else {
        ledger.losses += 1;
        ledger.current_streak = 0;
    }
    ledger.total_xp += outcome.xp;

    let unlocked = evaluate_unlocks(ledger);
    for badge in &unlocked {
        ledger.badges.insert(badge.to_string());
    }
    unlocked
}
