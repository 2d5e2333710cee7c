//! Single-flight prediction lifecycle
//!
//! At most one open prediction exists system-wide. `place` is atomic with
//! the open-slot check; `resolve` is idempotent and driven by a spawned
//! timer that sleeps the horizon outside every lock. No lock is held
//! across an await.

use super::types::{Direction, OpenPrediction, PlaceError, Prediction, ResolvedPrediction};
use crate::api::{ApiClient, ScoreRequest, StatsPayload};
use crate::clock::Clock;
use crate::feed::RateFeed;
use crate::ledger::{LedgerStore, PlayerLedger};
use crate::payout;
use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Events emitted by the lifecycle engine, in deterministic publish order
#[derive(Debug, Clone)]
pub enum GameEvent {
    PredictionPlaced(OpenPrediction),
    PredictionResolved(ResolvedPrediction),
    BadgeUnlocked(String),
    StatsUpdated(PlayerLedger),
}

#[derive(Default)]
struct Slot {
    open: Option<OpenPrediction>,
    /// Most recent resolved prediction; superseded, never deleted
    last: Option<Prediction>,
    timer: Option<JoinHandle<()>>,
}

/// The prediction state machine: Idle <-> Open
pub struct PredictionEngine {
    feed: Arc<RateFeed>,
    ledger: Mutex<PlayerLedger>,
    store: LedgerStore,
    clock: Arc<dyn Clock>,
    api: Option<Arc<ApiClient>>,
    slot: Mutex<Slot>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<GameEvent>>>,
}

impl PredictionEngine {
    pub fn new(
        feed: Arc<RateFeed>,
        ledger: PlayerLedger,
        store: LedgerStore,
        clock: Arc<dyn Clock>,
        api: Option<Arc<ApiClient>>,
    ) -> Self {
        Self {
            feed,
            ledger: Mutex::new(ledger),
            store,
            clock,
            api,
            slot: Mutex::new(Slot::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to lifecycle events; delivery order matches publish order
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Snapshot of the player's current ledger
    pub fn ledger(&self) -> PlayerLedger {
        self.ledger
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// True while a prediction awaits resolution
    pub fn is_open(&self) -> bool {
        self.slot.lock().map(|s| s.open.is_some()).unwrap_or(false)
    }

    /// The in-flight or most recently resolved prediction
    pub fn current(&self) -> Option<Prediction> {
        let slot = self.slot.lock().ok()?;
        match &slot.open {
            Some(open) => Some(Prediction::Open(open.clone())),
            None => slot.last.clone(),
        }
    }

    /// Place a bet: validate, debit the stake, snapshot the start rate,
    /// and arm the resolution timer.
    ///
    /// The open-slot check, stake validation, and debit happen under one
    /// lock acquisition so concurrent placements cannot both pass.
    pub fn place(
        self: &Arc<Self>,
        pair: &str,
        direction: Direction,
        stake: Decimal,
        horizon: Duration,
    ) -> Result<OpenPrediction, PlaceError> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.open.is_some() {
            return Err(PlaceError::AlreadyOpen);
        }

        let mut ledger = match self.ledger.lock() {
            Ok(ledger) => ledger,
            Err(poisoned) => poisoned.into_inner(),
        };
        if stake <= Decimal::ZERO || stake > ledger.credits {
            return Err(PlaceError::InvalidStake {
                stake,
                credits: ledger.credits,
            });
        }
        // Rate check before any mutation: failures must be side-effect free
        let rate = self.feed.current(pair).ok_or_else(|| PlaceError::NoRate {
            pair: pair.to_string(),
        })?;

        ledger.credits -= stake;
        let snapshot = ledger.clone();
        drop(ledger);

        let now = self.clock.now();
        let open = OpenPrediction {
            id: Uuid::new_v4(),
            pair: pair.to_string(),
            direction,
            stake,
            rate_at_start: rate,
            start_time: now,
            horizon_secs: horizon.num_seconds().max(0) as u64,
            end_time: now + horizon,
        };
        slot.open = Some(open.clone());
        slot.timer = Some(self.arm_timer(open.id, horizon));
        drop(slot);

        tracing::info!(
            pair,
            ?direction,
            %stake,
            rate,
            horizon_secs = open.horizon_secs,
            "prediction placed"
        );
        self.publish(GameEvent::PredictionPlaced(open.clone()));
        self.persist_local(&snapshot);
        self.publish(GameEvent::StatsUpdated(snapshot));
        Ok(open)
    }

    /// Resolve the open prediction with the given id.
    ///
    /// Idempotent: a no-op returning `None` when idle, already resolved,
    /// or the id does not match the open bet (e.g. a stale timer).
    pub fn resolve(self: &Arc<Self>, id: Uuid) -> Option<ResolvedPrediction> {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.open.as_ref().map(|o| o.id) != Some(id) {
            return None;
        }
        let open = slot.open.take()?;

        // Missing history degrades to the latest known rate, then to the
        // start rate, rather than failing the resolution.
        let rate_at_end = self
            .feed
            .nearest(&open.pair, open.end_time)
            .map(|s| s.rate)
            .or_else(|| self.feed.current(&open.pair))
            .unwrap_or(open.rate_at_start);

        let percent_move = (rate_at_end - open.rate_at_start) / open.rate_at_start;
        let outcome = payout::evaluate(open.direction, percent_move, open.stake);

        let (snapshot, unlocked) = {
            let mut ledger = match self.ledger.lock() {
                Ok(ledger) => ledger,
                Err(poisoned) => poisoned.into_inner(),
            };
            let unlocked = payout::apply(&mut ledger, &outcome);
            (ledger.clone(), unlocked)
        };

        let resolved = ResolvedPrediction {
            bet: open,
            rate_at_end,
            outcome,
        };
        slot.last = Some(Prediction::Resolved(resolved.clone()));
        slot.timer = None;
        drop(slot);

        tracing::info!(
            pair = %resolved.bet.pair,
            correct = resolved.outcome.correct,
            percent_move = resolved.outcome.percent_move,
            credit_delta = %resolved.outcome.credit_delta,
            xp = resolved.outcome.xp,
            "prediction resolved"
        );

        self.persist_local(&snapshot);
        self.publish(GameEvent::PredictionResolved(resolved.clone()));
        for badge in unlocked {
            tracing::info!(badge, "badge unlocked");
            self.publish(GameEvent::BadgeUnlocked(badge.to_string()));
        }
        self.publish(GameEvent::StatsUpdated(snapshot.clone()));
        self.persist_remote(snapshot);

        Some(resolved)
    }

    /// Reset the ledger to defaults and clear any open bet
    pub fn reset_stats(&self, initial_credits: Decimal) {
        let snapshot = {
            let mut slot = match self.slot.lock() {
                Ok(slot) => slot,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
            slot.open = None;
            slot.last = None;

            let mut ledger = match self.ledger.lock() {
                Ok(ledger) => ledger,
                Err(poisoned) => poisoned.into_inner(),
            };
            *ledger = PlayerLedger::new(ledger.username.clone(), initial_credits);
            ledger.clone()
        };

        self.persist_local(&snapshot);
        self.publish(GameEvent::StatsUpdated(snapshot));
    }

    /// Abort the pending resolution timer (process shutdown only; players
    /// cannot cancel bets)
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
        }
    }

    fn arm_timer(self: &Arc<Self>, id: Uuid, horizon: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let sleep_for = horizon.to_std().unwrap_or_default();
        tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            engine.resolve(id);
        })
    }

    fn persist_local(&self, snapshot: &PlayerLedger) {
        if let Err(e) = self.store.save(snapshot) {
            tracing::error!(error = %e, "failed to save player ledger");
        }
    }

    /// Best-effort score post; failure is logged, never surfaced
    fn persist_remote(&self, snapshot: PlayerLedger) {
        let api = match &self.api {
            Some(api) => Arc::clone(api),
            None => return,
        };
        tokio::spawn(async move {
            let request = ScoreRequest {
                username: snapshot.username.clone(),
                score: snapshot.score() as f64,
                credits: snapshot.credits.to_f64().unwrap_or(0.0),
                stats: StatsPayload {
                    wins: snapshot.wins,
                    losses: snapshot.losses,
                },
            };
            if !api.post_score(&request).await {
                tracing::warn!(username = %snapshot.username, "score not persisted to backend");
            }
        });
    }

    fn publish(&self, event: GameEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{FeedConfig, FeedMode, InstrumentConfig};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    struct Harness {
        engine: Arc<PredictionEngine>,
        feed: Arc<RateFeed>,
        clock: Arc<ManualClock>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        ));
        let instruments = vec![InstrumentConfig {
            pair: "USD_SGD".to_string(),
            base_rate: 1.35,
        }];
        let feed = Arc::new(RateFeed::new(
            FeedConfig {
                mode: FeedMode::Mock,
                mock_seed: 1,
                tick_interval_secs: 1,
                poll_interval_secs: 5,
            },
            instruments,
            clock.clone(),
            None,
        ));

        let dir = tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("player.json"));
        let ledger = PlayerLedger::new("guest", dec!(10000));
        let engine = Arc::new(PredictionEngine::new(
            feed.clone(),
            ledger,
            store,
            clock.clone(),
            None,
        ));

        Harness {
            engine,
            feed,
            clock,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_place_happy_path() {
        let h = harness();
        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();

        assert_eq!(open.pair, "USD_SGD");
        assert_eq!(open.rate_at_start, 1.35);
        assert_eq!(open.end_time - open.start_time, Duration::seconds(3600));
        assert!(h.engine.is_open());
        // Stake debited immediately
        assert_eq!(h.engine.ledger().credits, dec!(9900));
    }

    #[tokio::test]
    async fn test_place_rejects_bad_stakes() {
        let h = harness();

        let err = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(0), Duration::seconds(60))
            .unwrap_err();
        assert!(matches!(err, PlaceError::InvalidStake { .. }));

        let err = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(-10), Duration::seconds(60))
            .unwrap_err();
        assert!(matches!(err, PlaceError::InvalidStake { .. }));

        let err = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(10001), Duration::seconds(60))
            .unwrap_err();
        assert!(matches!(err, PlaceError::InvalidStake { .. }));

        // No side effects from rejected placements
        assert_eq!(h.engine.ledger().credits, dec!(10000));
        assert!(!h.engine.is_open());
    }

    #[tokio::test]
    async fn test_place_rejects_unknown_pair() {
        let h = harness();
        let err = h
            .engine
            .place("GBP_JPY", Direction::Up, dec!(100), Duration::seconds(60))
            .unwrap_err();
        assert!(matches!(err, PlaceError::NoRate { .. }));
        assert_eq!(h.engine.ledger().credits, dec!(10000));
    }

    #[tokio::test]
    async fn test_single_flight_invariant() {
        let h = harness();
        h.engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();

        let err = h
            .engine
            .place("USD_SGD", Direction::Down, dec!(50), Duration::seconds(60))
            .unwrap_err();
        assert!(matches!(err, PlaceError::AlreadyOpen));
        // Second attempt never touched the ledger
        assert_eq!(h.engine.ledger().credits, dec!(9900));
    }

    #[tokio::test]
    async fn test_resolve_win_up() {
        let h = harness();
        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();

        // Mock ticks move the rate; resolve against whatever history holds
        h.clock.advance(Duration::seconds(3600));
        for _ in 0..5 {
            h.feed.tick().await;
        }

        let resolved = h.engine.resolve(open.id).unwrap();
        assert!(!h.engine.is_open());

        let ledger = h.engine.ledger();
        if resolved.outcome.correct {
            assert_eq!(ledger.wins, 1);
            assert!(ledger.credits > dec!(9900));
        } else {
            assert_eq!(ledger.losses, 1);
            assert_eq!(ledger.credits, dec!(9900));
        }
        // Resolved prediction is retained, not deleted
        assert!(matches!(h.engine.current(), Some(Prediction::Resolved(_))));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let h = harness();
        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();

        assert!(h.engine.resolve(open.id).is_some());
        let credits_after = h.engine.ledger().credits;

        // Second resolve (stale timer) is a no-op
        assert!(h.engine.resolve(open.id).is_none());
        assert_eq!(h.engine.ledger().credits, credits_after);
        let ledger = h.engine.ledger();
        assert_eq!(ledger.wins + ledger.losses, 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_is_noop() {
        let h = harness();
        h.engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();

        assert!(h.engine.resolve(Uuid::new_v4()).is_none());
        assert!(h.engine.is_open());
    }

    #[tokio::test]
    async fn test_zero_move_loses() {
        let h = harness();
        // No ticks: the only sample is the seeded base rate, so the
        // resolution rate equals the start rate exactly.
        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(60))
            .unwrap();
        let resolved = h.engine.resolve(open.id).unwrap();

        assert_eq!(resolved.outcome.percent_move, 0.0);
        assert!(!resolved.outcome.correct);
        assert_eq!(resolved.outcome.credit_delta, dec!(-100));
        assert_eq!(h.engine.ledger().credits, dec!(9900));
    }

    #[tokio::test]
    async fn test_next_placement_supersedes_resolved() {
        let h = harness();
        let first = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(60))
            .unwrap();
        h.engine.resolve(first.id).unwrap();

        let second = h
            .engine
            .place("USD_SGD", Direction::Down, dec!(50), Duration::seconds(60))
            .unwrap();
        match h.engine.current() {
            Some(Prediction::Open(open)) => assert_eq!(open.id, second.id),
            other => panic!("expected open prediction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timer_resolves_after_horizon() {
        let h = harness();
        let open = h
            .engine
            .place(
                "USD_SGD",
                Direction::Up,
                dec!(100),
                Duration::milliseconds(50),
            )
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(!h.engine.is_open());
        match h.engine.current() {
            Some(Prediction::Resolved(resolved)) => assert_eq!(resolved.bet.id, open.id),
            other => panic!("expected resolved prediction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let h = harness();
        let mut events = h.engine.subscribe();

        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();
        h.engine.resolve(open.id).unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            GameEvent::PredictionPlaced(_)
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            GameEvent::StatsUpdated(_)
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            GameEvent::PredictionResolved(_)
        ));
        // Zero-move loss: no badges, then the final stats snapshot
        assert!(matches!(
            events.try_recv().unwrap(),
            GameEvent::StatsUpdated(_)
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ledger_persisted_on_place_and_resolve() {
        let h = harness();
        let store = LedgerStore::new(h._dir.path().join("player.json"));

        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();
        let saved = store.load_or_default("guest", dec!(0));
        assert_eq!(saved.credits, dec!(9900));

        h.engine.resolve(open.id).unwrap();
        let saved = store.load_or_default("guest", dec!(0));
        assert_eq!(saved.wins + saved.losses, 1);
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let h = harness();
        let open = h
            .engine
            .place("USD_SGD", Direction::Up, dec!(100), Duration::seconds(3600))
            .unwrap();
        h.engine.resolve(open.id).unwrap();

        h.engine.reset_stats(dec!(10000));
        let ledger = h.engine.ledger();
        assert_eq!(ledger.credits, dec!(10000));
        assert_eq!(ledger.wins + ledger.losses, 0);
        assert!(!h.engine.is_open());
        assert!(h.engine.current().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_aborts_timer() {
        let h = harness();
        h.engine
            .place(
                "USD_SGD",
                Direction::Up,
                dec!(100),
                Duration::milliseconds(50),
            )
            .unwrap();
        h.engine.shutdown();

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        // Timer aborted: the bet stays open until process exit
        assert!(h.engine.is_open());
    }
}
