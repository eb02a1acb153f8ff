//! Cross-validated training of the one-vs-rest genre classifier.
//!
//! Folds come from [`iterative_stratification`], which keeps each label's
//! positive rate roughly equal across folds even for rare tags. Each fold
//! fits a fresh [`MultiLabelClassifier`] on the remaining folds and is
//! scored on its own samples, producing one [`FoldReport`]. The classifier
//! kept for serving is fit separately on the whole corpus by
//! [`CrossValidatedTrainer::fit_final`].
//!
//! # Examples
//!
//! ```
//! use mangenre::encoder::SparseVector;
//! use mangenre::trainer::{CrossValidatedTrainer, TrainerConfig};
//!
//! let x: Vec<SparseVector> = (0..6)
//!     .map(|i| SparseVector::from_pairs(2, vec![(i % 2, 1.0)]))
//!     .collect();
//! let y: Vec<Vec<bool>> = (0..6).map(|i| vec![i % 2 == 0]).collect();
//! let labels = vec!["Action".to_string()];
//!
//! let trainer = CrossValidatedTrainer::new(TrainerConfig {
//!     folds: 3,
//!     ..TrainerConfig::default()
//! });
//! let reports = trainer.train_and_evaluate(&x, &y, &labels).unwrap();
//! assert_eq!(reports.len(), 3);
//! ```

mod classifier;
mod logistic;
mod report;
mod stratify;

pub use classifier::MultiLabelClassifier;
pub use logistic::{BinaryModel, LogisticOptions, Solver};
pub use report::{Average, FoldReport, LabelMetrics};
pub use stratify::{iterative_stratification, split_indices};

use tracing::{info, warn};

use crate::encoder::{LabelVector, SparseVector};
use crate::error::ModelError;

/// Settings for a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub folds: usize,
    /// Seed for fold tie-breaking.
    pub seed: u64,
    pub logistic: LogisticOptions,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            seed: 42,
            logistic: LogisticOptions::default(),
        }
    }
}

/// Runs stratified cross-validation and the final full-corpus fit.
#[derive(Debug, Clone)]
pub struct CrossValidatedTrainer {
    config: TrainerConfig,
}

impl CrossValidatedTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fits and scores one classifier per fold, using `config.folds` folds.
    ///
    /// `labels` names the columns of `y`. Fold classifiers are dropped once
    /// scored; only their reports are returned.
    pub fn train_and_evaluate(
        &self,
        x: &[SparseVector],
        y: &[LabelVector],
        labels: &[String],
    ) -> Result<Vec<FoldReport>, ModelError> {
        let folds = self.config.folds;
        if x.len() != y.len() {
            return Err(ModelError::mismatch("sample count", x.len(), y.len()));
        }
        let assignment = iterative_stratification(y, folds, self.config.seed)?;

        let mut reports = Vec::with_capacity(folds);
        for fold in 0..folds {
            let (train, test) = split_indices(&assignment, fold);
            if test.is_empty() || train.is_empty() {
                warn!(fold, "fold has an empty partition, skipping");
                continue;
            }

            let x_train = gather(x, &train);
            let y_train = gather(y, &train);
            let classifier = MultiLabelClassifier::fit(&x_train, &y_train, &self.config.logistic)?;

            let actual = gather(y, &test);
            let predicted = classifier.predict_many(&gather(x, &test))?;
            let report = FoldReport::evaluate(fold, train.len(), labels, &actual, &predicted)?;

            info!(
                fold = fold + 1,
                train = train.len(),
                test = test.len(),
                micro_f1 = report.micro.f1,
                macro_f1 = report.macro_avg.f1,
                "fold evaluated"
            );
            for metrics in report.undefined_labels() {
                warn!(fold = fold + 1, label = %metrics.label, "metrics undefined, treated as zero");
            }
            reports.push(report);
        }
        Ok(reports)
    }

    /// Fits the serving classifier on every sample.
    pub fn fit_final(
        &self,
        x: &[SparseVector],
        y: &[LabelVector],
    ) -> Result<MultiLabelClassifier, ModelError> {
        info!(samples = x.len(), "fitting final classifier on full corpus");
        MultiLabelClassifier::fit(x, y, &self.config.logistic)
    }
}

fn gather<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(n: usize) -> (Vec<SparseVector>, Vec<LabelVector>, Vec<String>) {
        let x = (0..n)
            .map(|i| SparseVector::from_pairs(3, vec![(i % 3, 1.0)]))
            .collect();
        let y = (0..n).map(|i| vec![i % 3 == 0, i % 3 == 1]).collect();
        (x, y, vec!["Action".to_string(), "Romance".to_string()])
    }

    #[test]
    fn one_report_per_fold() {
        let (x, y, labels) = corpus(30);
        let trainer = CrossValidatedTrainer::new(TrainerConfig::default());
        let reports = trainer.train_and_evaluate(&x, &y, &labels).unwrap();

        assert_eq!(reports.len(), 5);
        assert_eq!(reports.iter().map(|r| r.test_size).sum::<usize>(), 30);
        for report in &reports {
            assert_eq!(report.train_size + report.test_size, 30);
            assert_eq!(report.micro.f1, 1.0);
        }
    }

    #[test]
    fn invalid_fold_counts_are_rejected() {
        let (x, y, labels) = corpus(4);
        for folds in [1, 5] {
            let trainer = CrossValidatedTrainer::new(TrainerConfig {
                folds,
                ..TrainerConfig::default()
            });
            assert!(matches!(
                trainer.train_and_evaluate(&x, &y, &labels),
                Err(ModelError::InvalidFolds { .. })
            ));
        }
    }

    #[test]
    fn fold_count_comes_from_config() {
        let (x, y, labels) = corpus(12);
        let trainer = CrossValidatedTrainer::new(TrainerConfig {
            folds: 3,
            ..TrainerConfig::default()
        });
        assert_eq!(trainer.train_and_evaluate(&x, &y, &labels).unwrap().len(), 3);
    }

    #[test]
    fn final_fit_covers_all_labels() {
        let (x, y, _) = corpus(12);
        let trainer = CrossValidatedTrainer::new(TrainerConfig::default());
        let classifier = trainer.fit_final(&x, &y).unwrap();
        assert_eq!(classifier.n_labels(), 2);
        assert_eq!(classifier.predict_many(&x).unwrap(), y);
    }
}
