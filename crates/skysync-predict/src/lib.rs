//! Heuristic weather prediction for SkySync
//!
//! Produces a six-hour outlook with a plain-language explanation from manually entered
//! readings. No model or network service is involved.

pub mod engine;
pub mod heuristic;
pub mod types;

pub use engine::PredictionEngine;
pub use heuristic::{build_reasoning, classify, predict};
pub use types::{ConfidenceBand, ParseSeasonError, PredictionInput, PredictionResult, Season};
