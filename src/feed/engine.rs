//! Rate feed orchestrator
//!
//! Drives either the deterministic mock generator (1s ticks) or live
//! backend polling (5s). Any live failure falls back to mock mode for the
//! rest of the session; the transition is one-way.

use super::generator::RateGenerator;
use super::history::HistoryStore;
use super::types::{FeedEvent, RateSample};
use crate::api::ApiClient;
use crate::clock::Clock;
use crate::config::{FeedConfig, FeedMode, InstrumentConfig};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Orchestrates rate generation/polling, history retention, and ordered
/// rate-change notifications
pub struct RateFeed {
    config: FeedConfig,
    instruments: Vec<InstrumentConfig>,
    mode: Mutex<FeedMode>,
    generator: Mutex<RateGenerator>,
    history: RwLock<HistoryStore>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FeedEvent>>>,
    clock: Arc<dyn Clock>,
    api: Option<Arc<ApiClient>>,
}

impl RateFeed {
    /// Build a feed. In mock mode the generator is seeded immediately and
    /// one initial sample per instrument lands in history; in live mode
    /// history stays empty until the first successful poll.
    pub fn new(
        config: FeedConfig,
        instruments: Vec<InstrumentConfig>,
        clock: Arc<dyn Clock>,
        api: Option<Arc<ApiClient>>,
    ) -> Self {
        let generator = RateGenerator::new(config.mock_seed, &instruments);
        let mut history = HistoryStore::new();

        if config.mode == FeedMode::Mock {
            for sample in generator.initial_samples(clock.now()) {
                history.append(sample);
            }
        }

        Self {
            mode: Mutex::new(config.mode),
            generator: Mutex::new(generator),
            history: RwLock::new(history),
            subscribers: Mutex::new(Vec::new()),
            config,
            instruments,
            clock,
            api,
        }
    }

    /// Subscribe to feed events; delivery order matches publish order
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FeedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Current feed mode
    pub fn mode(&self) -> FeedMode {
        self.mode.lock().map(|m| *m).unwrap_or(FeedMode::Mock)
    }

    /// Latest known rate for an instrument, if positive
    pub fn current(&self, pair: &str) -> Option<f64> {
        self.history
            .read()
            .ok()
            .and_then(|h| h.latest(pair).map(|s| s.rate))
            .filter(|rate| *rate > 0.0)
    }

    /// The most recent `max_points` samples for an instrument
    pub fn range(&self, pair: &str, max_points: usize) -> Vec<RateSample> {
        self.history
            .read()
            .map(|h| h.range(pair, max_points))
            .unwrap_or_default()
    }

    /// The default-sized recent history window for an instrument
    pub fn recent(&self, pair: &str) -> Vec<RateSample> {
        self.range(pair, super::history::DEFAULT_RANGE_POINTS)
    }

    /// Historical sample closest to `target` (for prediction resolution)
    pub fn nearest(&self, pair: &str, target: DateTime<Utc>) -> Option<RateSample> {
        self.history
            .read()
            .ok()
            .and_then(|h| h.nearest(pair, target).cloned())
    }

    /// Run one tick batch according to the current mode
    pub async fn tick(&self) {
        match self.mode() {
            FeedMode::Mock => self.tick_mock(),
            FeedMode::Live => {
                if let Err(e) = self.poll_live().await {
                    tracing::warn!(error = %e, "live rate fetch failed, falling back to mock feed");
                    self.fall_back_to_mock();
                }
            }
        }
    }

    /// Spawn the periodic tick loop
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let feed = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let interval_secs = match feed.mode() {
                    FeedMode::Mock => feed.config.tick_interval_secs,
                    FeedMode::Live => feed.config.poll_interval_secs,
                };
                tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                feed.tick().await;
            }
        })
    }

    /// Advance the mock generator one step for every instrument
    fn tick_mock(&self) {
        let now = self.clock.now();
        let samples = match self.generator.lock() {
            Ok(mut generator) => generator.tick_all(now),
            Err(_) => return,
        };
        self.ingest_batch(samples);
    }

    /// Pull one snapshot from the backend and fan it into history
    async fn poll_live(&self) -> Result<(), crate::api::ApiError> {
        let api = match &self.api {
            Some(api) => api,
            None => {
                return Err(crate::api::ApiError::Transport(
                    "live mode requires a backend client".to_string(),
                ))
            }
        };

        let snapshot = api.fetch_rates().await?;
        let now = self.clock.now();
        let samples: Vec<RateSample> = snapshot
            .rates
            .into_iter()
            .filter(|(_, rate)| *rate > 0.0)
            .map(|(pair, rate)| RateSample {
                pair,
                rate,
                timestamp: now,
            })
            .collect();

        self.ingest_batch(samples);
        Ok(())
    }

    /// Append a tick batch to history and publish one `RateChanged` per
    /// instrument followed by a single aggregate `RatesUpdated`
    fn ingest_batch(&self, samples: Vec<RateSample>) {
        if samples.is_empty() {
            return;
        }

        if let Ok(mut history) = self.history.write() {
            for sample in &samples {
                history.append(sample.clone());
            }
        }

        let mut rates = BTreeMap::new();
        for sample in &samples {
            rates.insert(sample.pair.clone(), sample.rate);
            self.publish(FeedEvent::RateChanged {
                pair: sample.pair.clone(),
                rate: sample.rate,
            });
        }
        self.publish(FeedEvent::RatesUpdated { rates });
    }

    /// One-way live -> mock transition: re-seed the generator from the
    /// configured seed and resume local ticking. Never reverts.
    fn fall_back_to_mock(&self) {
        {
            let mut mode = match self.mode.lock() {
                Ok(mode) => mode,
                Err(_) => return,
            };
            if *mode == FeedMode::Mock {
                return;
            }
            *mode = FeedMode::Mock;
        }

        let now = self.clock.now();
        let samples = match self.generator.lock() {
            Ok(mut generator) => {
                *generator = RateGenerator::new(self.config.mock_seed, &self.instruments);
                generator.initial_samples(now)
            }
            Err(_) => return,
        };

        tracing::warn!(seed = self.config.mock_seed, "feed now in mock mode for the rest of the session");
        self.ingest_batch(samples);
        self.publish(FeedEvent::FellBackToMock);
    }

    fn publish(&self, event: FeedEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}
