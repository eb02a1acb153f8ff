//! L2-regularized binary logistic regression over sparse rows.
//!
//! The objective is `C * sum(log_loss) + 0.5 * ||w||^2` with an
//! unpenalized intercept, minimized by either limited-memory BFGS or plain
//! gradient descent with a backtracking line search.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoder::SparseVector;

/// Optimizer used to fit each per-label model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Solver {
    /// Limited-memory BFGS; handles large sparse vocabularies well.
    #[default]
    Lbfgs,
    GradientDescent,
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Solver::Lbfgs => write!(f, "lbfgs"),
            Solver::GradientDescent => write!(f, "gradient-descent"),
        }
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lbfgs" => Ok(Solver::Lbfgs),
            "gradient-descent" | "gd" => Ok(Solver::GradientDescent),
            other => Err(format!("unknown solver '{}' (expected lbfgs or gradient-descent)", other)),
        }
    }
}

/// Hyperparameters shared by every per-label fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticOptions {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the largest gradient component.
    pub tolerance: f64,
    pub solver: Solver,
}

impl Default for LogisticOptions {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            solver: Solver::Lbfgs,
        }
    }
}

/// The decision function for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BinaryModel {
    /// The label never varied in training; always answer the same.
    Constant { value: bool },
    Linear { weights: Vec<f64>, intercept: f64 },
}

impl BinaryModel {
    /// Signed margin; positive means the label fires.
    pub fn decision(&self, x: &SparseVector) -> f64 {
        match self {
            BinaryModel::Constant { value: true } => 1.0,
            BinaryModel::Constant { value: false } => -1.0,
            BinaryModel::Linear { weights, intercept } => x.dot(weights) + intercept,
        }
    }

    pub fn predict(&self, x: &SparseVector) -> bool {
        self.decision(x) > 0.0
    }

    /// Positive-class probability.
    pub fn probability(&self, x: &SparseVector) -> f64 {
        match self {
            BinaryModel::Constant { value } => f64::from(u8::from(*value)),
            BinaryModel::Linear { .. } => sigmoid(self.decision(x)),
        }
    }
}

/// Outcome of one fit, including whether the solver met its tolerance.
#[derive(Debug, Clone)]
pub struct BinaryFit {
    pub model: BinaryModel,
    pub iterations: usize,
    pub converged: bool,
}

/// Fits one label's model on rows `x` with targets `y`.
///
/// `x` must be non-empty and all rows must share one width.
pub fn fit_binary(x: &[SparseVector], y: &[bool], options: &LogisticOptions) -> BinaryFit {
    let positives = y.iter().filter(|&&v| v).count();
    if positives == 0 || positives == y.len() {
        return BinaryFit {
            model: BinaryModel::Constant {
                value: positives > 0,
            },
            iterations: 0,
            converged: true,
        };
    }

    let dim = x.first().map(SparseVector::dim).unwrap_or(0);
    let objective = Objective { x, y, c: options.c, dim };
    let start = vec![0.0; dim + 1];
    let (theta, iterations, converged) = match options.solver {
        Solver::Lbfgs => lbfgs(&objective, start, options),
        Solver::GradientDescent => gradient_descent(&objective, start, options),
    };
    debug!(iterations, converged, "fitted binary model");

    let mut weights = theta;
    let intercept = weights.pop().unwrap_or(0.0);
    BinaryFit {
        model: BinaryModel::Linear { weights, intercept },
        iterations,
        converged,
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(-m))` without overflow.
fn log_loss(margin: f64) -> f64 {
    if margin > 0.0 {
        (-margin).exp().ln_1p()
    } else {
        -margin + margin.exp().ln_1p()
    }
}

/// Parameters are laid out as `[w_0 .. w_{dim-1}, intercept]`.
struct Objective<'a> {
    x: &'a [SparseVector],
    y: &'a [bool],
    c: f64,
    dim: usize,
}

impl Objective<'_> {
    fn value_and_gradient(&self, theta: &[f64]) -> (f64, Vec<f64>) {
        let (weights, intercept) = theta.split_at(self.dim);
        let intercept = intercept[0];

        let mut value = 0.5 * weights.iter().map(|w| w * w).sum::<f64>();
        let mut grad: Vec<f64> = weights.to_vec();
        grad.push(0.0);

        for (row, &target) in self.x.iter().zip(self.y) {
            let sign = if target { 1.0 } else { -1.0 };
            let margin = sign * (row.dot(weights) + intercept);
            value += self.c * log_loss(margin);

            let coeff = -self.c * sign * sigmoid(-margin);
            for (i, v) in row.iter() {
                grad[i] += coeff * v;
            }
            grad[self.dim] += coeff;
        }
        (value, grad)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;

/// Backtracking line search along `direction`. Returns the accepted point.
fn line_search(
    objective: &Objective<'_>,
    theta: &[f64],
    value: f64,
    grad: &[f64],
    direction: &[f64],
    initial_step: f64,
) -> Option<(Vec<f64>, f64, Vec<f64>)> {
    let slope = dot(grad, direction);
    if slope >= 0.0 {
        return None;
    }
    let mut step = initial_step;
    for _ in 0..MAX_BACKTRACKS {
        let candidate: Vec<f64> = theta
            .iter()
            .zip(direction)
            .map(|(t, d)| t + step * d)
            .collect();
        let (next_value, next_grad) = objective.value_and_gradient(&candidate);
        if next_value <= value + ARMIJO * step * slope {
            return Some((candidate, next_value, next_grad));
        }
        step *= 0.5;
    }
    None
}

const HISTORY: usize = 10;

fn lbfgs(objective: &Objective<'_>, mut theta: Vec<f64>, options: &LogisticOptions) -> (Vec<f64>, usize, bool) {
    let (mut value, mut grad) = objective.value_and_gradient(&theta);
    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(HISTORY);

    for iteration in 0..options.max_iter {
        if max_abs(&grad) <= options.tolerance {
            return (theta, iteration, true);
        }

        let mut q = grad.clone();
        let mut alphas = Vec::with_capacity(history.len());
        for (s, y, rho) in history.iter().rev() {
            let alpha = rho * dot(s, &q);
            for (qi, yi) in q.iter_mut().zip(y) {
                *qi -= alpha * yi;
            }
            alphas.push(alpha);
        }
        let gamma = history
            .back()
            .map(|(s, y, _)| dot(s, y) / dot(y, y))
            .unwrap_or_else(|| 1.0 / max_abs(&grad).max(1.0));
        for qi in q.iter_mut() {
            *qi *= gamma;
        }
        for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
            let beta = rho * dot(y, &q);
            for (qi, si) in q.iter_mut().zip(s) {
                *qi += (alpha - beta) * si;
            }
        }
        let direction: Vec<f64> = q.iter().map(|v| -v).collect();

        let Some((next, next_value, next_grad)) =
            line_search(objective, &theta, value, &grad, &direction, 1.0)
        else {
            // Curvature information went stale; restart from steepest descent.
            if history.is_empty() {
                return (theta, iteration, false);
            }
            history.clear();
            continue;
        };

        let s: Vec<f64> = next.iter().zip(&theta).map(|(a, b)| a - b).collect();
        let y: Vec<f64> = next_grad.iter().zip(&grad).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-12 {
            if history.len() == HISTORY {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        theta = next;
        value = next_value;
        grad = next_grad;
    }

    let converged = max_abs(&grad) <= options.tolerance;
    (theta, options.max_iter, converged)
}

fn gradient_descent(
    objective: &Objective<'_>,
    mut theta: Vec<f64>,
    options: &LogisticOptions,
) -> (Vec<f64>, usize, bool) {
    let (mut value, mut grad) = objective.value_and_gradient(&theta);

    for iteration in 0..options.max_iter {
        if max_abs(&grad) <= options.tolerance {
            return (theta, iteration, true);
        }
        let direction: Vec<f64> = grad.iter().map(|g| -g).collect();
        let Some((next, next_value, next_grad)) =
            line_search(objective, &theta, value, &grad, &direction, 1.0)
        else {
            return (theta, iteration, false);
        };
        theta = next;
        value = next_value;
        grad = next_grad;
    }

    let converged = max_abs(&grad) <= options.tolerance;
    (theta, options.max_iter, converged)
}
