//! Per-fold precision, recall and F1 on the held-out partition.

use std::fmt;

use serde::Serialize;

use crate::encoder::LabelVector;
use crate::error::ModelError;

/// Metrics for one label column.
///
/// A ratio whose denominator is zero is reported as `0.0` and flagged
/// undefined instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Held-out samples carrying this label.
    pub support: usize,
    pub precision_undefined: bool,
    pub recall_undefined: bool,
    pub f1_undefined: bool,
}

impl LabelMetrics {
    fn from_counts(label: &str, tp: usize, fp: usize, fn_: usize) -> Self {
        let (precision, precision_undefined) = ratio(tp, tp + fp);
        let (recall, recall_undefined) = ratio(tp, tp + fn_);
        let (f1, f1_undefined) = ratio(2 * tp, 2 * tp + fp + fn_);
        Self {
            label: label.to_string(),
            precision,
            recall,
            f1,
            support: tp + fn_,
            precision_undefined,
            recall_undefined,
            f1_undefined,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.precision_undefined || self.recall_undefined || self.f1_undefined
    }
}

/// Aggregate precision/recall/F1 across labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Average {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation of one cross-validation fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldReport {
    /// Zero-based fold index.
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub labels: Vec<LabelMetrics>,
    pub micro: Average,
    pub macro_avg: Average,
    pub weighted: Average,
}

impl FoldReport {
    /// Scores `predicted` against `actual`, both shaped `[test_size][classes]`.
    pub fn evaluate(
        fold: usize,
        train_size: usize,
        classes: &[String],
        actual: &[LabelVector],
        predicted: &[LabelVector],
    ) -> Result<Self, ModelError> {
        if actual.len() != predicted.len() {
            return Err(ModelError::mismatch("sample count", actual.len(), predicted.len()));
        }
        if let Some(row) = actual.iter().chain(predicted).find(|row| row.len() != classes.len()) {
            return Err(ModelError::mismatch("label width", classes.len(), row.len()));
        }

        let mut labels = Vec::with_capacity(classes.len());
        let (mut tp_all, mut fp_all, mut fn_all) = (0, 0, 0);
        for (column, class) in classes.iter().enumerate() {
            let (mut tp, mut fp, mut fn_) = (0, 0, 0);
            for (truth, guess) in actual.iter().zip(predicted) {
                match (truth[column], guess[column]) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            tp_all += tp;
            fp_all += fp;
            fn_all += fn_;
            labels.push(LabelMetrics::from_counts(class, tp, fp, fn_));
        }

        let micro = {
            let m = LabelMetrics::from_counts("", tp_all, fp_all, fn_all);
            Average {
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            }
        };
        let macro_avg = average(&labels, |_| 1.0);
        let weighted = average(&labels, |m| m.support as f64);

        Ok(Self {
            fold,
            train_size,
            test_size: actual.len(),
            labels,
            micro,
            macro_avg,
            weighted,
        })
    }

    /// Labels whose metrics were at least partly undefined.
    pub fn undefined_labels(&self) -> impl Iterator<Item = &LabelMetrics> {
        self.labels.iter().filter(|m| m.is_undefined())
    }
}

fn ratio(numerator: usize, denominator: usize) -> (f64, bool) {
    if denominator == 0 {
        (0.0, true)
    } else {
        (numerator as f64 / denominator as f64, false)
    }
}

fn average(labels: &[LabelMetrics], weight: impl Fn(&LabelMetrics) -> f64) -> Average {
    let support = labels.iter().map(|m| m.support).sum();
    let total: f64 = labels.iter().map(&weight).sum();
    if total == 0.0 {
        return Average {
            support,
            ..Average::default()
        };
    }
    let mean = |field: fn(&LabelMetrics) -> f64| {
        labels.iter().map(|m| weight(m) * field(m)).sum::<f64>() / total
    };
    Average {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
        support,
    }
}

fn cell(value: f64, undefined: bool) -> String {
    if undefined {
        format!("{:.2}*", value)
    } else {
        format!("{:.2} ", value)
    }
}

impl fmt::Display for FoldReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|m| m.label.chars().count())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "fold {} (train {}, test {})",
            self.fold + 1,
            self.train_size,
            self.test_size
        )?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for m in &self.labels {
            writeln!(
                f,
                "{:>width$} {:>10} {:>10} {:>10} {:>9}",
                m.label,
                cell(m.precision, m.precision_undefined),
                cell(m.recall, m.recall_undefined),
                cell(m.f1, m.f1_undefined),
                m.support
            )?;
        }
        writeln!(f)?;
        for (name, avg) in [
            ("micro avg", &self.micro),
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted),
        ] {
            writeln!(
                f,
                "{:>width$} {:>10} {:>10} {:>10} {:>9}",
                name,
                cell(avg.precision, false),
                cell(avg.recall, false),
                cell(avg.f1, false),
                avg.support
            )?;
        }
        if self.undefined_labels().next().is_some() {
            writeln!(f, "* undefined (no predicted or actual positives), treated as zero")?;
        }
        Ok(())
    }
}
