//! Rate feed module
//!
//! Deterministic mock generation, bounded history, and the feed
//! orchestrator with live polling and one-way mock fallback

mod engine;
mod generator;
mod history;
mod types;

pub use engine::RateFeed;
pub use generator::RateGenerator;
pub use history::{HistoryStore, DEFAULT_RANGE_POINTS, MAX_HISTORY_POINTS};
pub use types::{FeedEvent, RateSample};
