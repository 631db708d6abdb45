use std::mem;

use crate::heap::IndexedHeap;
use crate::napsack::direction::{Decreasing, Increasing, Regime, ShiftDirection};
use crate::napsack::{weight, Solution, SweepStats, Workspace};

/// Project by lowering the multiplier from `lambda`.
///
/// `lambda` must not lie below the optimal multiplier, i.e. `s(lambda) <= b`.
/// Returns the multiplier with `s(lambda*) = b`, or the last multiplier
/// visited when no coordinate is free once the search stops.
///
/// # Panics
///
/// Panics if the search exceeds `2n + 1` rounds, which only happens when the
/// preconditions are broken (NaN input, non-positive weights).
pub fn project_with_decreasing_shift(
    x: &[f64],
    lambda: f64,
    a: Option<&[f64]>,
    b: f64,
    workspace: &mut Workspace,
) -> Solution {
    project_with_shift::<Decreasing>(x, lambda, a, b, workspace)
}

/// Project by raising the multiplier from `lambda`, which must not lie above
/// the optimum, i.e. `s(lambda) >= b`. Mirror of
/// [`project_with_decreasing_shift`].
pub fn project_with_increasing_shift(
    x: &[f64],
    lambda: f64,
    a: Option<&[f64]>,
    b: f64,
    workspace: &mut Workspace,
) -> Solution {
    project_with_shift::<Increasing>(x, lambda, a, b, workspace)
}

/// The breakpoint search in direction `D`.
pub fn project_with_shift<D: ShiftDirection>(
    x: &[f64],
    mut lambda: f64,
    a: Option<&[f64]>,
    b: f64,
    workspace: &mut Workspace,
) -> Solution {
    let n = x.len();
    debug_assert!(a.map_or(true, |a| a.len() == n), "weight vector length differs from x");
    debug_assert!(a.map_or(true, |a| a.iter().all(|&ai| ai > 0.0)), "weights must be positive");

    let mut sweep = Sweep::<D>::new(x, a, workspace);
    sweep.partition(lambda);

    let max_rounds = 2 * n + 1;
    for round in 1..=max_rounds {
        let next = sweep.next_breakpoint();
        // Between `next` and `lambda` the slope is affine in the multiplier.
        let s = sweep.asum - next * sweep.a2sum;
        if D::reached(s, b) || next == D::EXHAUSTED {
            if sweep.a2sum != 0.0 {
                lambda = (sweep.asum - b) / sweep.a2sum;
            }
            return sweep.finish(lambda, round, workspace);
        }
        lambda = next;

        if round == 1 {
            sweep.build_heaps();
        }
        sweep.settle_free(lambda);
        sweep.release_bound(lambda);
    }

    panic!("breakpoint search did not converge within {max_rounds} rounds");
}

// State of one search. Owns the workspace buffers until `finish` hands
// them back.
struct Sweep<'a, D: ShiftDirection> {
    x: &'a [f64],
    a: Option<&'a [f64]>,
    breakpoints: Vec<f64>,
    bound: IndexedHeap<D::Order>,
    free: IndexedHeap<D::Order>,
    // Nearest breakpoints, tracked by hand until the heaps are built.
    bound_top: f64,
    free_top: f64,
    asum: f64,
    a2sum: f64,
    promotions: usize,
}

impl<'a, D: ShiftDirection> Sweep<'a, D> {
    fn new(x: &'a [f64], a: Option<&'a [f64]>, workspace: &mut Workspace) -> Self {
        let n = x.len();
        let mut breakpoints = mem::take(&mut workspace.breakpoints);
        breakpoints.clear();
        breakpoints.resize(n, 0.0);
        let mut bound_slots = mem::take(&mut workspace.bound_slots);
        let mut free_slots = mem::take(&mut workspace.free_slots);
        if bound_slots.len() < n {
            bound_slots.resize(n, 0);
        }
        if free_slots.len() < n {
            free_slots.resize(n, 0);
        }
        workspace.forget_sets();

        Sweep {
            x,
            a,
            breakpoints,
            bound: IndexedHeap::from_buffer(bound_slots),
            free: IndexedHeap::from_buffer(free_slots),
            bound_top: D::EXHAUSTED,
            free_top: D::EXHAUSTED,
            asum: 0.0,
            a2sum: 0.0,
            promotions: 0,
        }
    }

    // Sort every coordinate into its regime at `lambda` and seed the sums.
    fn partition(&mut self, lambda: f64) {
        for (i, &xi) in self.x.iter().enumerate() {
            let ai = weight(self.a, i);
            match D::classify(xi - ai * lambda) {
                Regime::Bound => {
                    let t = D::bound_breakpoint(xi, ai);
                    self.breakpoints[i] = t;
                    self.bound.push_unordered(i);
                    self.bound_top = D::nearer(self.bound_top, t);
                    self.asum += D::bound_weight(ai);
                }
                Regime::Free => {
                    let t = D::free_breakpoint(xi, ai);
                    self.breakpoints[i] = t;
                    self.free.push_unordered(i);
                    self.free_top = D::nearer(self.free_top, t);
                    self.asum += ai * xi;
                    self.a2sum += ai * ai;
                }
                Regime::Settled => self.asum += D::settled_weight(ai),
            }
        }
    }

    fn build_heaps(&mut self) {
        self.free.build(&self.breakpoints);
        self.bound.build(&self.breakpoints);
        debug_assert!(self.free.check(&self.breakpoints, self.x.len(), 0).is_ok());
        debug_assert!(self.bound.check(&self.breakpoints, self.x.len(), 0).is_ok());
    }

    fn next_breakpoint(&self) -> f64 {
        D::nearer(self.free_top, self.bound_top)
    }

    // Free coordinates whose breakpoint has been passed leave both heaps.
    fn settle_free(&mut self, lambda: f64) {
        while let Some(e) = self.free.top() {
            if !D::passed(self.breakpoints[e], lambda) {
                break;
            }
            self.free.delete_top(&self.breakpoints);
            let ae = weight(self.a, e);
            self.asum += D::settle_delta(self.x[e], ae);
            self.a2sum -= ae * ae;
            self.promotions += 1;
        }
        if self.free.is_empty() {
            // No drift left over from the subtractions.
            self.a2sum = 0.0;
        }
        self.free_top = self.free.top_key(&self.breakpoints).unwrap_or(D::EXHAUSTED);
    }

    // Bound coordinates whose breakpoint has been passed move to the free
    // heap under their new breakpoint, which lies strictly beyond `lambda`.
    fn release_bound(&mut self, lambda: f64) {
        while let Some(e) = self.bound.top() {
            if !D::passed(self.breakpoints[e], lambda) {
                break;
            }
            self.bound.delete_top(&self.breakpoints);
            let (xe, ae) = (self.x[e], weight(self.a, e));
            self.asum += D::release_delta(xe, ae);
            self.a2sum += ae * ae;
            self.breakpoints[e] = D::free_breakpoint(xe, ae);
            self.free.insert(e, &self.breakpoints);
            self.promotions += 1;
        }
        self.bound_top = self.bound.top_key(&self.breakpoints).unwrap_or(D::EXHAUSTED);
        self.free_top = self.free.top_key(&self.breakpoints).unwrap_or(D::EXHAUSTED);
    }

    fn finish(self, lambda: f64, rounds: usize, workspace: &mut Workspace) -> Solution {
        let stats = SweepStats {
            rounds,
            promotions: self.promotions,
            heap_comparisons: self.bound.comparisons() + self.free.comparisons(),
        };
        let (bound, free) = (self.bound.len(), self.free.len());

        workspace.breakpoints = self.breakpoints;
        workspace.bound_slots = self.bound.into_buffer();
        workspace.free_slots = self.free.into_buffer();
        workspace.bound_len = bound;
        workspace.free_len = free;

        Solution {
            lambda,
            bound,
            free,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use itertools::Itertools;
    use super::*;

    #[test]
    fn test_decreasing_walks_three_breakpoints() {
        // Arrange
        // At lambda = 1 every coordinate sits at 0 with breakpoints 0.25, 0.75, 0.5.
        let x = [0.25, 0.75, 0.5];
        let mut workspace = Workspace::new();

        // Act
        let solution = project_with_decreasing_shift(&x, 1.0, None, 0.5, &mut workspace);

        // Assert
        // Coordinates 1 and 2 free up; (1.25 - 0.5) / 2 lands before 0.25.
        assert_eq!(solution.lambda, 0.375);
        assert_eq!(solution.stats.rounds, 3);
        assert_eq!(solution.stats.promotions, 2);
        assert_eq!(workspace.bound_set(), &[0]);
        assert_eq!(workspace.free_set().iter().copied().sorted().collect_vec(), vec![1, 2]);
    }

    #[test]
    fn test_increasing_walks_five_breakpoints() {
        // Arrange
        // At lambda = -1 every coordinate sits at 1 and counts fully in asum.
        let x = [0.25, 0.75, 0.5];
        let mut workspace = Workspace::new();

        // Act
        let solution = project_with_increasing_shift(&x, -1.0, None, 0.5, &mut workspace);

        // Assert
        // All three free up, then coordinate 0 drops to 0 at 0.25.
        assert_eq!(solution.lambda, 0.375);
        assert_eq!(solution.stats.rounds, 5);
        assert_eq!(solution.stats.promotions, 4);
        assert!(workspace.bound_set().is_empty());
        assert_eq!(workspace.free_set().iter().copied().sorted().collect_vec(), vec![1, 2]);
    }

    #[test]
    fn test_closed_form_without_building_heaps() {
        // Arrange
        let x = [0.2, 0.9, 0.5];
        let mut workspace = Workspace::new();

        // Act
        let down = project_with_decreasing_shift(&x, 0.0, None, 1.0, &mut workspace);
        let up = project_with_increasing_shift(&x, 0.0, None, 1.0, &mut workspace);

        // Assert
        // All three are free at 0, and (1.6 - 1) / 3 is already the answer.
        assert_relative_eq!(down.lambda, 0.2, epsilon = 1e-12);
        assert_relative_eq!(up.lambda, 0.2, epsilon = 1e-12);
        assert_eq!(down.stats.rounds, 1);
        assert_eq!(up.stats.rounds, 1);
        assert_eq!(down.stats.heap_comparisons, 0);
        assert_eq!(up.free, 3);
    }

    #[test]
    fn test_weighted_decreasing_trace() {
        // Arrange
        // At lambda = 2 both sit at 0. They free up at 0.25 and 0.75 and
        // would settle only at -0.25.
        let x = [0.5, 0.75];
        let a = [2.0, 1.0];
        let mut workspace = Workspace::new();

        // Act
        let solution = project_with_decreasing_shift(&x, 2.0, Some(&a), 1.0, &mut workspace);

        // Assert
        // Both free: s = 2*0.5 + 0.75 - (4 + 1) * lambda = 1  =>  lambda = 0.15.
        assert_relative_eq!(solution.lambda, 0.15, epsilon = 1e-12);
        assert_eq!(solution.stats.rounds, 3);
        assert_eq!(solution.free, 2);
        assert_eq!(solution.bound, 0);
    }

    #[test]
    fn test_empty_input_returns_guess() {
        let mut workspace = Workspace::new();

        let down = project_with_decreasing_shift(&[], 0.75, None, 0.0, &mut workspace);
        let up = project_with_increasing_shift(&[], -0.5, None, 0.0, &mut workspace);

        assert_eq!(down.lambda, 0.75);
        assert_eq!(up.lambda, -0.5);
        assert_eq!(down.stats.rounds, 1);
    }

    #[test]
    fn test_all_settled_keeps_guess() {
        // Arrange
        // Everything is at 1 while lowering the multiplier, so nothing can move.
        let x = [3.0, 4.0];
        let mut workspace = Workspace::new();

        // Act
        let solution = project_with_decreasing_shift(&x, 0.0, None, 1.0, &mut workspace);

        // Assert
        assert_eq!(solution.lambda, 0.0);
        assert_eq!(solution.bound + solution.free, 0);
    }

    #[test]
    fn test_workspace_is_reused_across_sizes() {
        // Arrange
        let mut workspace = Workspace::with_capacity(2);
        let large: Vec<f64> = (0..50).map(|i| i as f64 / 50.0).collect();

        // Act
        let first = project_with_decreasing_shift(&large, 2.0, None, 10.0, &mut workspace);
        let second = project_with_decreasing_shift(&[0.25, 0.75, 0.5], 1.0, None, 0.5, &mut workspace);

        // Assert
        assert_relative_eq!(crate::napsack::slope(&large, None, first.lambda), 10.0, epsilon = 1e-9);
        assert_eq!(second.lambda, 0.375);
        assert_eq!(workspace.breakpoints().len(), 3);
        assert_eq!(workspace.bound_set(), &[0]);
    }
}
