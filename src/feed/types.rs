//! Rate feed types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single observed rate for one instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSample {
    /// Currency pair identifier (e.g. "USD_SGD")
    pub pair: String,
    /// Observed rate, always positive
    pub rate: f64,
    /// UTC instant the sample was taken
    pub timestamp: DateTime<Utc>,
}

/// Events published by the feed, in deterministic publish order:
/// one `RateChanged` per updated instrument, then one `RatesUpdated`
/// per tick batch.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A single instrument's rate changed
    RateChanged { pair: String, rate: f64 },
    /// Aggregate snapshot after a full tick batch
    RatesUpdated { rates: BTreeMap<String, f64> },
    /// Live polling failed and the feed fell back to the mock generator
    FellBackToMock,
}
