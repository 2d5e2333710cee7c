//! Badge catalog and unlock evaluation

use crate::ledger::PlayerLedger;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Stable badge identifier from the fixed catalog
pub type BadgeId = &'static str;

pub const FIRST_WIN: BadgeId = "first_win";
pub const STREAK_3: BadgeId = "streak_3";
pub const STREAK_5: BadgeId = "streak_5";
pub const STREAK_10: BadgeId = "streak_10";
pub const XP_100: BadgeId = "xp_100";
pub const XP_500: BadgeId = "xp_500";
pub const XP_1000: BadgeId = "xp_1000";
pub const CREDITS_20K: BadgeId = "credits_20k";
pub const CREDITS_50K: BadgeId = "credits_50k";

/// Every badge, in unlock check order
pub const BADGE_CATALOG: [BadgeId; 9] = [
    FIRST_WIN,
    STREAK_3,
    STREAK_5,
    STREAK_10,
    XP_100,
    XP_500,
    XP_1000,
    CREDITS_20K,
    CREDITS_50K,
];

const CREDITS_20K_THRESHOLD: Decimal = dec!(20000);
const CREDITS_50K_THRESHOLD: Decimal = dec!(50000);

/// Badges earned by the current ledger state that are not yet held,
/// in fixed check order. Held badges are never returned again.
///
/// Streak checks use exact equality on purpose (a streak that jumps past a
/// threshold skips the badge); XP and credit checks are thresholds.
pub fn evaluate_unlocks(ledger: &PlayerLedger) -> Vec<BadgeId> {
    let mut unlocked = Vec::new();
    let mut check = |id: BadgeId, earned: bool| {
        if earned && !ledger.has_badge(id) {
            unlocked.push(id);
        }
    };

    check(FIRST_WIN, ledger.wins == 1);
    check(STREAK_3, ledger.current_streak == 3);
    check(STREAK_5, ledger.current_streak == 5);
    check(STREAK_10, ledger.current_streak == 10);
    check(XP_100, ledger.total_xp >= 100);
    check(XP_500, ledger.total_xp >= 500);
    check(XP_1000, ledger.total_xp >= 1000);
    check(CREDITS_20K, ledger.credits >= CREDITS_20K_THRESHOLD);
    check(CREDITS_50K, ledger.credits >= CREDITS_50K_THRESHOLD);

    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> PlayerLedger {
        PlayerLedger::new("guest", dec!(10000))
    }

    #[test]
    fn test_fresh_ledger_unlocks_nothing() {
        assert!(evaluate_unlocks(&ledger()).is_empty());
    }

    #[test]
    fn test_first_win_exact_equality() {
        let mut l = ledger();
        l.wins = 1;
        assert_eq!(evaluate_unlocks(&l), vec![FIRST_WIN]);

        l.wins = 2;
        assert!(evaluate_unlocks(&l).is_empty());
    }

    #[test]
    fn test_streak_badges_exact_not_threshold() {
        let mut l = ledger();
        l.wins = 4;
        l.current_streak = 3;
        assert_eq!(evaluate_unlocks(&l), vec![STREAK_3]);

        // A streak of 4 earns nothing: checks are ==, not >=
        l.current_streak = 4;
        assert!(evaluate_unlocks(&l).is_empty());

        l.current_streak = 5;
        assert_eq!(evaluate_unlocks(&l), vec![STREAK_5]);
        l.current_streak = 10;
        assert_eq!(evaluate_unlocks(&l), vec![STREAK_10]);
    }

    #[test]
    fn test_xp_badges_are_thresholds() {
        let mut l = ledger();
        l.total_xp = 99;
        assert!(evaluate_unlocks(&l).is_empty());

        l.total_xp = 100;
        assert_eq!(evaluate_unlocks(&l), vec![XP_100]);

        // Jumping straight past several thresholds unlocks them all at once
        l.total_xp = 1200;
        assert_eq!(evaluate_unlocks(&l), vec![XP_100, XP_500, XP_1000]);
    }

    #[test]
    fn test_credit_badges_are_thresholds() {
        let mut l = ledger();
        l.credits = dec!(19999.99);
        assert!(evaluate_unlocks(&l).is_empty());

        l.credits = dec!(20000);
        assert_eq!(evaluate_unlocks(&l), vec![CREDITS_20K]);

        l.credits = dec!(51000);
        assert_eq!(evaluate_unlocks(&l), vec![CREDITS_20K, CREDITS_50K]);
    }

    #[test]
    fn test_held_badges_never_returned() {
        let mut l = ledger();
        l.wins = 1;
        l.total_xp = 150;
        l.badges.insert(FIRST_WIN.to_string());
        l.badges.insert(XP_100.to_string());

        assert!(evaluate_unlocks(&l).is_empty());
    }

    #[test]
    fn test_check_order_matches_catalog() {
        let mut l = ledger();
        l.wins = 1;
        l.current_streak = 1;
        l.total_xp = 600;
        l.credits = dec!(25000);

        let unlocked = evaluate_unlocks(&l);
        assert_eq!(unlocked, vec![FIRST_WIN, XP_100, XP_500, CREDITS_20K]);
    }
}
