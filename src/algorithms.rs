// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe
use std::fmt;

mod projected_gradient;

pub use projected_gradient::{ProjectedGradientStep, StepReport};

/// Common errors thrown by algorithms.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Input sets don't have matching lengths.
    InputLenMismatch { expected: usize, actual: usize },

    /// A weight is zero or negative.
    NonPositiveWeight { index: usize },

    /// A coordinate or a weight is NaN or infinite.
    NonFinite { index: usize },

    /// The knapsack target is not in `[0, capacity]`, where the capacity is
    /// the sum of the weights.
    TargetOutOfRange { target: f64, capacity: f64 },

    /// A configuration value is outside of its domain.
    InvalidParameter { name: &'static str, value: f64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputLenMismatch { expected, actual } => write!(
                f,
                "input sets don't have the same length (expected {expected} items, got {actual})",
            ),
            Error::NonPositiveWeight { index } => write!(f, "weight {index} is not positive"),
            Error::NonFinite { index } => write!(f, "item {index} is not a finite number"),
            Error::TargetOutOfRange { target, capacity } => {
                write!(f, "target {target} is outside of [0, {capacity}]")
            }
            Error::InvalidParameter { name, value } => {
                write!(f, "invalid value {value} for {name}")
            }
        }
    }
}

impl std::error::Error for Error {}
