//! Iterative stratification for multi-label fold assignment.
//!
//! Rarest labels are distributed first so that every label's positives are
//! spread across folds in proportion to fold size. Samples without any
//! label are placed last, into whichever fold still wants the most samples.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encoder::LabelVector;
use crate::error::ModelError;

/// Assigns every sample to one of `folds` folds.
///
/// Returns a vector parallel to `labels` holding each sample's fold index.
/// Ties are broken with a generator seeded from `seed`, so the same inputs
/// always produce the same assignment.
pub fn iterative_stratification(
    labels: &[LabelVector],
    folds: usize,
    seed: u64,
) -> Result<Vec<usize>, ModelError> {
    let n = labels.len();
    if folds < 2 || folds > n {
        return Err(ModelError::InvalidFolds { folds, samples: n });
    }
    let n_labels = labels[0].len();
    if let Some(row) = labels.iter().find(|row| row.len() != n_labels) {
        return Err(ModelError::mismatch("label width", n_labels, row.len()));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let share = 1.0 / folds as f64;

    let mut wanted_samples = vec![n as f64 * share; folds];
    let mut wanted_labels: Vec<Vec<f64>> = (0..folds)
        .map(|_| {
            (0..n_labels)
                .map(|l| positives(labels, l) as f64 * share)
                .collect()
        })
        .collect();

    let mut assignment: Vec<Option<usize>> = vec![None; n];
    let mut remaining: Vec<usize> = (0..n_labels).map(|l| positives(labels, l)).collect();

    while let Some(label) = rarest_remaining(&remaining) {
        let members: Vec<usize> = (0..n)
            .filter(|&i| assignment[i].is_none() && labels[i][label])
            .collect();

        for sample in members {
            let candidates = best_folds(
                (0..folds).map(|f| (wanted_labels[f][label], wanted_samples[f])),
            );
            let fold = candidates[rng.random_range(0..candidates.len())];

            assignment[sample] = Some(fold);
            wanted_samples[fold] -= 1.0;
            for (l, &on) in labels[sample].iter().enumerate() {
                if on {
                    wanted_labels[fold][l] -= 1.0;
                    remaining[l] -= 1;
                }
            }
        }
    }

    for sample in 0..n {
        if assignment[sample].is_none() {
            let candidates = best_folds((0..folds).map(|f| (wanted_samples[f], 0.0)));
            let fold = candidates[rng.random_range(0..candidates.len())];
            assignment[sample] = Some(fold);
            wanted_samples[fold] -= 1.0;
        }
    }

    Ok(assignment.into_iter().map(|f| f.unwrap_or(0)).collect())
}

/// Train/test index split for `fold` given an assignment vector.
pub fn split_indices(assignment: &[usize], fold: usize) -> (Vec<usize>, Vec<usize>) {
    (0..assignment.len()).partition(|&i| assignment[i] != fold)
}

fn positives(labels: &[LabelVector], label: usize) -> usize {
    labels.iter().filter(|row| row[label]).count()
}

fn rarest_remaining(remaining: &[usize]) -> Option<usize> {
    remaining
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .min_by_key(|(_, count)| **count)
        .map(|(label, _)| label)
}

/// Indices whose `(primary, secondary)` demand is maximal, lexicographically.
fn best_folds(demand: impl Iterator<Item = (f64, f64)>) -> Vec<usize> {
    let demand: Vec<(f64, f64)> = demand.collect();
    let best = demand
        .iter()
        .copied()
        .fold((f64::NEG_INFINITY, f64::NEG_INFINITY), |best, d| {
            if d.0 > best.0 || (d.0 == best.0 && d.1 > best.1) {
                d
            } else {
                best
            }
        });
    demand
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == best)
        .map(|(i, _)| i)
        .collect()
}
