//! Euclidean projection onto `{x : 0 <= x <= 1, a'x = b}`.
//!
//! The projection of `y` is `x_i = clamp(y_i - a_i * lambda, 0, 1)` for the
//! multiplier `lambda` at which the slope
//!
//! ```text
//! s(lambda) = sum_i a_i * clamp(y_i - a_i * lambda, 0, 1)
//! ```
//!
//! equals `b`. `s` is piecewise linear and non-increasing, with a breakpoint
//! wherever a coordinate enters or leaves the open interval (0, 1). Starting
//! from a guess on a known side of the optimum, the search walks those
//! breakpoints toward it with two indexed heaps, so each coordinate changes
//! regime at most twice.
//!
//! A missing weight vector means `a_i = 1` for every coordinate.
//!
//! # Example
//!
//! ```rust
//! use qpcut::napsack::{project_primal, project_with_decreasing_shift, Workspace};
//!
//! let y = [0.2, 0.9, 0.5];
//! let mut workspace = Workspace::new();
//! let solution = project_with_decreasing_shift(&y, 1.0, None, 1.0, &mut workspace);
//!
//! let mut x = [0.0; 3];
//! project_primal(&y, None, solution.lambda, &mut x);
//! assert!((x.iter().sum::<f64>() - 1.0).abs() < 1e-12);
//! ```

mod direction;
mod sweep;

pub use direction::{Decreasing, Increasing, Regime, ShiftDirection};
pub use sweep::{project_with_decreasing_shift, project_with_increasing_shift, project_with_shift};

/// Scratch buffers for the breakpoint search.
///
/// Buffers grow on demand and are kept between calls. After a call,
/// [`bound_set`] and [`free_set`] hold the final memberships, in no
/// particular order.
///
/// [`bound_set`]: Workspace::bound_set
/// [`free_set`]: Workspace::free_set
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    breakpoints: Vec<f64>,
    bound_slots: Vec<usize>,
    free_slots: Vec<usize>,
    bound_len: usize,
    free_len: usize,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffers for problems of up to `n` coordinates.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            breakpoints: Vec::with_capacity(n),
            bound_slots: vec![0; n],
            free_slots: vec![0; n],
            bound_len: 0,
            free_len: 0,
        }
    }

    /// Coordinates still at the bound the last search moved away from.
    pub fn bound_set(&self) -> &[usize] {
        &self.bound_slots[..self.bound_len]
    }

    /// Coordinates strictly inside the box when the last search stopped.
    pub fn free_set(&self) -> &[usize] {
        &self.free_slots[..self.free_len]
    }

    /// Breakpoints of the bound and free coordinates of the last search.
    /// Entries of the other coordinates are meaningless.
    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub(crate) fn forget_sets(&mut self) {
        self.bound_len = 0;
        self.free_len = 0;
    }
}

/// Work done by one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// Slope tests, including the final one.
    pub rounds: usize,

    /// Coordinates moved between regimes.
    pub promotions: usize,

    /// Key comparisons across both heaps.
    pub heap_comparisons: u64,
}

/// Outcome of one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// The multiplier solving `s(lambda) = b`.
    pub lambda: f64,

    /// Size of [`Workspace::bound_set`].
    pub bound: usize,

    /// Size of [`Workspace::free_set`].
    pub free: usize,

    pub stats: SweepStats,
}

#[inline]
pub(crate) fn weight(a: Option<&[f64]>, i: usize) -> f64 {
    a.map_or(1.0, |a| a[i])
}

/// Evaluate `s(lambda)`.
pub fn slope(x: &[f64], a: Option<&[f64]>, lambda: f64) -> f64 {
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let ai = weight(a, i);
            ai * (xi - ai * lambda).clamp(0.0, 1.0)
        })
        .sum()
}

/// Write the projected point for multiplier `lambda` into `out`.
pub fn project_primal(x: &[f64], a: Option<&[f64]>, lambda: f64, out: &mut [f64]) {
    debug_assert_eq!(x.len(), out.len());
    for (i, (out_i, &xi)) in out.iter_mut().zip(x).enumerate() {
        *out_i = (xi - weight(a, i) * lambda).clamp(0.0, 1.0);
    }
}

/// Project from an arbitrary guess, picking the search direction from the
/// slope at `lambda`. If the guess already hits `b` exactly it is returned
/// as is, with empty sets and no work recorded.
pub fn napsack(
    x: &[f64],
    lambda: f64,
    a: Option<&[f64]>,
    b: f64,
    workspace: &mut Workspace,
) -> Solution {
    let s = slope(x, a, lambda);
    if s < b {
        project_with_decreasing_shift(x, lambda, a, b, workspace)
    } else if s > b {
        project_with_increasing_shift(x, lambda, a, b, workspace)
    } else {
        workspace.forget_sets();
        Solution {
            lambda,
            bound: 0,
            free: 0,
            stats: SweepStats::default(),
        }
    }
}
