//! Checked knapsack projection instances.
//!
//! The functions of [`crate::napsack`] take their preconditions on trust.
//! [`KnapsackProblem`] validates an instance once so it can be solved any
//! number of times from different guesses.

use tracing::debug;

use crate::algorithms::Error;
use crate::napsack::{self, Solution, Workspace};

/// A point to project onto `{x : 0 <= x <= 1, a'x = target}`.
#[derive(Debug, Clone)]
pub struct KnapsackProblem {
    y: Vec<f64>,
    weights: Option<Vec<f64>>,
    target: f64,
    capacity: f64,
}

/// The projected point with the multiplier it was obtained from.
#[derive(Debug, Clone)]
pub struct Projection {
    pub solution: Solution,
    pub x: Vec<f64>,
    residual: f64,
}

impl Projection {
    /// `a'x - target` for the projected point.
    pub fn residual(&self) -> f64 {
        self.residual
    }
}

impl KnapsackProblem {
    pub fn new(y: Vec<f64>, weights: Option<Vec<f64>>, target: f64) -> Result<Self, Error> {
        if let Some(index) = y.iter().position(|yi| !yi.is_finite()) {
            return Err(Error::NonFinite { index });
        }

        let capacity = match &weights {
            Some(weights) => {
                if weights.len() != y.len() {
                    return Err(Error::InputLenMismatch {
                        expected: y.len(),
                        actual: weights.len(),
                    });
                }
                if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
                    return Err(Error::NonFinite { index });
                }
                if let Some(index) = weights.iter().position(|&w| w <= 0.0) {
                    return Err(Error::NonPositiveWeight { index });
                }
                weights.iter().sum()
            }
            None => y.len() as f64,
        };

        if !(0.0..=capacity).contains(&target) {
            return Err(Error::TargetOutOfRange { target, capacity });
        }

        Ok(Self {
            y,
            weights,
            target,
            capacity,
        })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Sum of the weights: the largest reachable target.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Project from the multiplier guess `lambda`, on either side of the
    /// optimum.
    pub fn solve(&self, lambda: f64, workspace: &mut Workspace) -> Projection {
        let a = self.weights();
        let solution = napsack::napsack(&self.y, lambda, a, self.target, workspace);

        let mut x = vec![0.0; self.y.len()];
        napsack::project_primal(&self.y, a, solution.lambda, &mut x);
        let reached: f64 = x
            .iter()
            .enumerate()
            .map(|(i, xi)| napsack::weight(a, i) * xi)
            .sum();
        let residual = reached - self.target;

        debug!(
            n = self.y.len(),
            lambda = solution.lambda,
            rounds = solution.stats.rounds,
            promotions = solution.stats.promotions,
            residual,
            "projected onto the knapsack polytope"
        );

        Projection { solution, x, residual }
    }
}
