//! Errors raised by the encoding, training and inference stages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fitting, persisting or applying a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Encoders cannot be fit without at least one labeled row.
    #[error("Cannot fit encoders on an empty corpus")]
    EmptyCorpus,

    /// Feature or label dimensions disagree between fitted components.
    #[error("Encoder mismatch: {what} (expected {expected}, found {found})")]
    EncoderMismatch {
        what: &'static str,
        expected: String,
        found: String,
    },

    /// Fold count outside `2..=n_samples`.
    #[error("Invalid fold count {folds} for {samples} samples")]
    InvalidFolds { folds: usize, samples: usize },

    /// A model artifact file is absent; nothing has been trained yet.
    #[error("Model artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Filesystem errors while reading or writing artifacts and corpora.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors for persisted artifacts.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Shorthand for a dimension mismatch between two counts.
    pub(crate) fn mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Self::EncoderMismatch {
            what,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
