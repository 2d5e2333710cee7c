//! Deterministic mock rate generator
//!
//! Seeded random walk with bounded volatility: small per-tick drift, a 5%
//! chance of a 5x spike move, and a hard clamp to +/-10% of each
//! instrument's base rate. Identical seed and call sequence produce a
//! bit-identical rate series on every platform.

use super::RateSample;
use crate::config::InstrumentConfig;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-instrument generator state
#[derive(Debug, Clone)]
struct InstrumentState {
    pair: String,
    base_rate: f64,
    current_rate: f64,
}

/// Seeded generator producing successive rate samples for a set of
/// tracked instruments
pub struct RateGenerator {
    rng: ChaCha8Rng,
    instruments: Vec<InstrumentState>,
}

impl RateGenerator {
    /// Create a generator with every current rate set to its base rate
    pub fn new(seed: u64, instruments: &[InstrumentConfig]) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            instruments: instruments
                .iter()
                .map(|i| InstrumentState {
                    pair: i.pair.clone(),
                    base_rate: i.base_rate,
                    current_rate: i.base_rate,
                })
                .collect(),
        }
    }

    /// Emit the initial sample (current == base) for every instrument
    /// without consuming any randomness
    pub fn initial_samples(&self, now: DateTime<Utc>) -> Vec<RateSample> {
        self.instruments
            .iter()
            .map(|i| RateSample {
                pair: i.pair.clone(),
                rate: i.current_rate,
                timestamp: now,
            })
            .collect()
    }

    /// Advance every instrument one step, in configured instrument order.
    ///
    /// Two uniform draws are consumed per instrument in fixed order (drift
    /// draw, then spike-gate draw); the order must not change or seeded
    /// reproducibility breaks.
    pub fn tick_all(&mut self, now: DateTime<Utc>) -> Vec<RateSample> {
        let mut samples = Vec::with_capacity(self.instruments.len());
        for idx in 0..self.instruments.len() {
            samples.push(self.step(idx, now));
        }
        samples
    }

    /// Advance a single instrument one step, if tracked
    pub fn tick(&mut self, pair: &str, now: DateTime<Utc>) -> Option<RateSample> {
        let idx = self.instruments.iter().position(|i| i.pair == pair)?;
        Some(self.step(idx, now))
    }

    fn step(&mut self, idx: usize, now: DateTime<Utc>) -> RateSample {
        let u: f64 = self.rng.gen();
        let mut drift = (u - 0.5) * 0.0005;

        // 5% chance of a larger move
        let v: f64 = self.rng.gen();
        if v < 0.05 {
            drift *= 5.0;
        }

        let state = &mut self.instruments[idx];
        let new_rate = (state.current_rate * (1.0 + drift))
            .clamp(state.base_rate * 0.9, state.base_rate * 1.1);
        state.current_rate = new_rate;

        RateSample {
            pair: state.pair.clone(),
            rate: new_rate,
            timestamp: now,
        }
    }

    /// Current (last emitted) rate for an instrument
    pub fn current_rate(&self, pair: &str) -> Option<f64> {
        self.instruments
            .iter()
            .find(|i| i.pair == pair)
            .map(|i| i.current_rate)
    }
}
