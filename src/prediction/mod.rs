//! Prediction lifecycle module
//!
//! Single-active-bet state machine: place, countdown, resolve

mod engine;
mod types;

pub use engine::{GameEvent, PredictionEngine};
pub use types::{Direction, OpenPrediction, PlaceError, Prediction, ResolvedPrediction};
