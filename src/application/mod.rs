//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod batch;
mod normalizer;
mod prediction;

pub use batch::{BatchPredictor, PREDICTION_COLUMN, PROBABILITY_COLUMN};
pub use normalizer::FeatureNormalizer;
pub use prediction::PredictionService;
