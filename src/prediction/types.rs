//! Prediction types and placement errors

use crate::payout::Outcome;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Predicted rate direction over the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A bet awaiting resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPrediction {
    pub id: Uuid,
    pub pair: String,
    pub direction: Direction,
    pub stake: Decimal,
    /// Rate snapshot taken at placement
    pub rate_at_start: f64,
    pub start_time: DateTime<Utc>,
    pub horizon_secs: u64,
    /// `start_time + horizon`
    pub end_time: DateTime<Utc>,
}

impl OpenPrediction {
    pub fn horizon(&self) -> Duration {
        Duration::seconds(self.horizon_secs as i64)
    }
}

/// A bet with its realized outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPrediction {
    pub bet: OpenPrediction,
    pub rate_at_end: f64,
    pub outcome: Outcome,
}

/// A prediction in either lifecycle phase. Resolved-only fields are only
/// reachable in the `Resolved` variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Prediction {
    Open(OpenPrediction),
    Resolved(ResolvedPrediction),
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Prediction::Resolved(_))
    }

    pub fn pair(&self) -> &str {
        match self {
            Prediction::Open(open) => &open.pair,
            Prediction::Resolved(resolved) => &resolved.bet.pair,
        }
    }
}

/// Placement-time failures; none of these leave side effects
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaceError {
    #[error("invalid stake {stake}: must be positive and at most {credits} available credits")]
    InvalidStake { stake: Decimal, credits: Decimal },
    #[error("a prediction is already open")]
    AlreadyOpen,
    #[error("no current rate for {pair}")]
    NoRate { pair: String },
}
