//! Run command implementation

use crate::config::Config;
use crate::feed::FeedEvent;
use crate::prediction::{Direction, GameEvent};
use crate::session::GameSession;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Place a bet on this pair at startup (e.g. USD_SGD)
    #[arg(long)]
    pub pair: Option<String>,

    /// Direction for the startup bet
    #[arg(long, value_enum, default_value = "up")]
    pub direction: BetDirection,

    /// Stake in credits for the startup bet
    #[arg(long, default_value = "100")]
    pub stake: Decimal,

    /// Bet horizon in seconds
    #[arg(long, default_value_t = 30)]
    pub horizon_secs: u64,

    /// Exit after this many seconds instead of waiting for ctrl-c
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum BetDirection {
    Up,
    Down,
}

impl From<BetDirection> for Direction {
    fn from(d: BetDirection) -> Self {
        match d {
            BetDirection::Up => Direction::Up,
            BetDirection::Down => Direction::Down,
        }
    }
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let session = GameSession::start(config).await?;

        let mut feed_events = session.feed().subscribe();
        let mut game_events = session.engine().subscribe();

        if let Some(pair) = &self.pair {
            let open = session.engine().place(
                pair,
                self.direction.into(),
                self.stake,
                chrono::Duration::seconds(self.horizon_secs as i64),
            )?;
            tracing::info!(
                id = %open.id,
                pair = %open.pair,
                stake = %open.stake,
                rate = open.rate_at_start,
                "bet placed, resolving in {}s",
                self.horizon_secs
            );
        }

        let deadline = self
            .duration_secs
            .map(|secs| tokio::time::Instant::now() + std::time::Duration::from_secs(secs));

        loop {
            let timeout = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down...");
                    break;
                }
                _ = timeout => {
                    tracing::info!("Run duration elapsed, shutting down");
                    break;
                }
                Some(event) = feed_events.recv() => log_feed_event(&event),
                Some(event) = game_events.recv() => log_game_event(&event),
            }
        }

        session.shutdown();
        for instrument in &session.config().instruments {
            let history = session.feed().recent(&instrument.pair);
            tracing::debug!(
                pair = %instrument.pair,
                samples = history.len(),
                "rate history at close"
            );
        }
        let ledger = session.engine().ledger();
        tracing::info!(
            credits = %ledger.credits,
            wins = ledger.wins,
            losses = ledger.losses,
            xp = ledger.total_xp,
            badges = ledger.badges.len(),
            "session closed"
        );
        Ok(())
    }
}

fn log_feed_event(event: &FeedEvent) {
    match event {
        FeedEvent::RateChanged { pair, rate } => {
            tracing::debug!(pair = %pair, rate, "rate changed");
        }
        FeedEvent::RatesUpdated { rates } => {
            tracing::trace!(count = rates.len(), "rates updated");
        }
        FeedEvent::FellBackToMock => {
            tracing::warn!("live feed unavailable, now on synthetic rates");
        }
    }
}

fn log_game_event(event: &GameEvent) {
    match event {
        GameEvent::PredictionPlaced(open) => {
            tracing::info!(pair = %open.pair, stake = %open.stake, "prediction placed");
        }
        GameEvent::PredictionResolved(resolved) => {
            tracing::info!(
                pair = %resolved.bet.pair,
                correct = resolved.outcome.correct,
                delta = %resolved.outcome.credit_delta,
                xp = resolved.outcome.xp,
                "prediction resolved"
            );
        }
        GameEvent::BadgeUnlocked(badge) => {
            tracing::info!(badge = %badge, "badge unlocked");
        }
        GameEvent::StatsUpdated(ledger) => {
            tracing::debug!(credits = %ledger.credits, xp = ledger.total_xp, "stats updated");
        }
    }
}
