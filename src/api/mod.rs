//! Backend REST client
//!
//! Auth, FX rate polling, score persistence, and leaderboard fetch over
//! HTTP/JSON with bearer-token auth and a shared retry policy.

mod client;
mod types;

pub use client::{ApiClient, RetryPolicy};
pub use types::{ApiError, FxRatesSnapshot, LeaderboardEntry, ScoreRequest, ScoreResponse, StatsPayload};
