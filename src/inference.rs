//! Inference and scoring against ground-truth tags.
mod predictor;
mod scoring;

pub use predictor::GenrePredictor;
pub use scoring::{precision, score};
