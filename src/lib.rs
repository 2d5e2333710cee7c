//! fx-arcade: timed FX prediction game engine
//!
//! This library provides the core components for:
//! - Deterministic mock rate feeds with bounded volatility
//! - Live rate polling from a backend with one-way mock fallback
//! - Bounded per-instrument rate history with nearest-timestamp lookup
//! - Single-flight prediction lifecycle (place, countdown, resolve)
//! - Payout, XP, and badge progression from fixed formulas
//! - Player ledger with local persistence
//! - Retrying REST client for auth, score posting, and leaderboards

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod feed;
pub mod ledger;
pub mod payout;
pub mod prediction;
pub mod session;
pub mod telemetry;
