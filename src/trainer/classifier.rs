//! One-vs-rest multi-label classifier.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::logistic::{BinaryModel, LogisticOptions, fit_binary};
use crate::encoder::{LabelVector, SparseVector};
use crate::error::ModelError;

/// One independent [`BinaryModel`] per label column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLabelClassifier {
    n_features: usize,
    models: Vec<BinaryModel>,
}

impl MultiLabelClassifier {
    /// Fits one binary model per column of `y`.
    ///
    /// `x` and `y` are parallel; every feature row must share one width and
    /// every label row must share one width.
    pub fn fit(
        x: &[SparseVector],
        y: &[LabelVector],
        options: &LogisticOptions,
    ) -> Result<Self, ModelError> {
        let Some(first) = x.first() else {
            return Err(ModelError::EmptyCorpus);
        };
        if x.len() != y.len() {
            return Err(ModelError::mismatch("sample count", x.len(), y.len()));
        }
        let n_features = first.dim();
        if let Some(row) = x.iter().find(|row| row.dim() != n_features) {
            return Err(ModelError::mismatch("feature width", n_features, row.dim()));
        }
        let n_labels = y[0].len();
        if let Some(row) = y.iter().find(|row| row.len() != n_labels) {
            return Err(ModelError::mismatch("label width", n_labels, row.len()));
        }

        let mut models = Vec::with_capacity(n_labels);
        for label in 0..n_labels {
            let targets: Vec<bool> = y.iter().map(|row| row[label]).collect();
            let fit = fit_binary(x, &targets, options);
            if !fit.converged {
                warn!(
                    label,
                    iterations = fit.iterations,
                    max_iter = options.max_iter,
                    "solver did not converge; consider raising max_iter"
                );
            }
            models.push(fit.model);
        }

        Ok(Self { n_features, models })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_labels(&self) -> usize {
        self.models.len()
    }

    /// Per-label decisions for one feature row.
    pub fn predict(&self, x: &SparseVector) -> Result<LabelVector, ModelError> {
        self.check_width(x)?;
        Ok(self.models.iter().map(|model| model.predict(x)).collect())
    }

    /// Per-label positive-class probabilities for one feature row.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Vec<f64>, ModelError> {
        self.check_width(x)?;
        Ok(self.models.iter().map(|model| model.probability(x)).collect())
    }

    pub fn predict_many(&self, x: &[SparseVector]) -> Result<Vec<LabelVector>, ModelError> {
        x.iter().map(|row| self.predict(row)).collect()
    }

    /// Checks that every linear model carries exactly `n_features` weights.
    pub(crate) fn check_consistency(&self) -> Result<(), ModelError> {
        for model in &self.models {
            if let BinaryModel::Linear { weights, .. } = model {
                if weights.len() != self.n_features {
                    return Err(ModelError::mismatch(
                        "classifier weights",
                        self.n_features,
                        weights.len(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_width(&self, x: &SparseVector) -> Result<(), ModelError> {
        if x.dim() == self.n_features {
            Ok(())
        } else {
            Err(ModelError::mismatch("feature width", self.n_features, x.dim()))
        }
    }
}
