//! Bounded per-instrument rate history

use super::RateSample;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Maximum samples retained per instrument; oldest evicted first
pub const MAX_HISTORY_POINTS: usize = 1000;

/// Default window for history reads that don't ask for a specific size
pub const DEFAULT_RANGE_POINTS: usize = 100;

/// Time-ordered rate history for all tracked instruments.
///
/// Reads on an unknown instrument return `None`/empty rather than failing.
#[derive(Debug, Default)]
pub struct HistoryStore {
    series: HashMap<String, VecDeque<RateSample>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest entry once the per-instrument
    /// cap is reached
    pub fn append(&mut self, sample: RateSample) {
        let series = self.series.entry(sample.pair.clone()).or_default();
        series.push_back(sample);
        if series.len() > MAX_HISTORY_POINTS {
            series.pop_front();
        }
    }

    /// Most recent sample for an instrument
    pub fn latest(&self, pair: &str) -> Option<&RateSample> {
        self.series.get(pair).and_then(|s| s.back())
    }

    /// The most recent `max_points` samples, oldest first
    pub fn range(&self, pair: &str, max_points: usize) -> Vec<RateSample> {
        match self.series.get(pair) {
            Some(series) => {
                let start = series.len().saturating_sub(max_points);
                series.iter().skip(start).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Sample closest in time to `target`, by linear scan over the series.
    ///
    /// Ties resolve to the earlier-inserted sample (strict improvement
    /// required to replace the current best).
    pub fn nearest(&self, pair: &str, target: DateTime<Utc>) -> Option<&RateSample> {
        let series = self.series.get(pair)?;

        let mut best: Option<(&RateSample, i64)> = None;
        for sample in series {
            let diff = (target - sample.timestamp).num_milliseconds().abs();
            match best {
                Some((_, best_diff)) if diff >= best_diff => {}
                _ => best = Some((sample, diff)),
            }
        }
        best.map(|(sample, _)| sample)
    }

    /// Number of samples held for an instrument
    pub fn len(&self, pair: &str) -> usize {
        self.series.get(pair).map_or(0, |s| s.len())
    }

    /// True when no samples are held for an instrument
    pub fn is_empty(&self, pair: &str) -> bool {
        self.len(pair) == 0
    }
}
