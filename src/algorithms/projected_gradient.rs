use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::algorithms::Error;
use crate::graph::Graph;
use crate::napsack::{SweepStats, Workspace};
use crate::problem::KnapsackProblem;
use crate::Partition;

/// One projected-gradient step on the relaxed edge cut of a bisection.
///
/// Starting from a random relaxation `x` in `[0, 1]^n`, the step moves
/// against the gradient of [`Graph::relaxed_cut`] and projects back onto the
/// vertices whose weighted sum is `target_fraction` of the total weight. Part
/// IDs are obtained by rounding the projected point at one half.
///
/// # Example
///
/// ```rust
/// use qpcut::algorithms::ProjectedGradientStep;
/// use qpcut::graph::Graph;
/// use qpcut::Partition;
///
/// let mut graph = Graph::new();
/// for (u, v) in [(0, 1), (1, 2), (2, 3)] {
///     graph.insert(u, v, 1.0);
///     graph.insert(v, u, 1.0);
/// }
///
/// let mut partition = [0; 4];
/// let report = ProjectedGradientStep { seed: Some(7), ..Default::default() }
///     .partition(&mut partition, (&graph, None))
///     .unwrap();
///
/// assert!(report.residual.abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProjectedGradientStep {
    /// Length of the gradient step. Must be positive.
    pub step_size: f64,

    /// Share of the total vertex weight that goes to part 1, in `[0, 1]`.
    pub target_fraction: f64,

    /// Seed of the initial relaxation. Entropy is used when absent.
    pub seed: Option<u64>,
}

impl Default for ProjectedGradientStep {
    fn default() -> Self {
        Self {
            step_size: 0.5,
            target_fraction: 0.5,
            seed: None,
        }
    }
}

/// Diagnostic data of a [`ProjectedGradientStep`] run.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Multiplier of the knapsack projection.
    pub lambda: f64,

    pub stats: SweepStats,

    /// Relaxed cut of the initial point.
    pub relaxed_cut_before: f64,

    /// Relaxed cut of the projected point.
    pub relaxed_cut_after: f64,

    /// `a'x - b` for the projected point.
    pub residual: f64,

    /// The projected point.
    pub relaxation: Vec<f64>,
}

fn projected_gradient_step(
    part_ids: &mut [usize],
    graph: &Graph,
    weights: Option<&[f64]>,
    step_size: f64,
    target_fraction: f64,
    seed: Option<u64>,
) -> Result<StepReport, Error> {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let x: Vec<f64> = (0..graph.len()).map(|_| rng.gen_range(0.0..1.0)).collect();
    let relaxed_cut_before = graph.relaxed_cut(&x);

    let gradient = graph.cut_gradient(&x);
    let y: Vec<f64> = x
        .iter()
        .zip(&gradient)
        .map(|(xi, gi)| xi - step_size * gi)
        .collect();

    let capacity = weights.map_or(graph.len() as f64, |weights| weights.iter().sum());
    let target = target_fraction * capacity;
    let problem = KnapsackProblem::new(y, weights.map(<[f64]>::to_vec), target)?;
    debug!(n = problem.len(), target = problem.target(), "projecting the gradient step");

    let mut workspace = Workspace::with_capacity(problem.len());
    let projection = problem.solve(0.0, &mut workspace);

    for (part_id, &xi) in part_ids.iter_mut().zip(&projection.x) {
        *part_id = usize::from(xi >= 0.5);
    }

    let relaxed_cut_after = graph.relaxed_cut(&projection.x);
    info!(
        lambda = projection.solution.lambda,
        relaxed_cut_before,
        relaxed_cut_after,
        "projected gradient step done"
    );

    Ok(StepReport {
        lambda: projection.solution.lambda,
        stats: projection.solution.stats,
        relaxed_cut_before,
        relaxed_cut_after,
        residual: projection.residual(),
        relaxation: projection.x,
    })
}

impl<'a> Partition<(&'a Graph, Option<&'a [f64]>)> for ProjectedGradientStep {
    type Metadata = StepReport;
    type Error = Error;

    fn partition(
        &mut self,
        part_ids: &mut [usize],
        (graph, weights): (&'a Graph, Option<&'a [f64]>),
    ) -> Result<Self::Metadata, Self::Error> {
        if part_ids.len() != graph.len() {
            return Err(Error::InputLenMismatch {
                expected: graph.len(),
                actual: part_ids.len(),
            });
        }
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "step_size",
                value: self.step_size,
            });
        }
        if !(0.0..=1.0).contains(&self.target_fraction) {
            return Err(Error::InvalidParameter {
                name: "target_fraction",
                value: self.target_fraction,
            });
        }

        projected_gradient_step(
            part_ids,
            graph,
            weights,
            self.step_size,
            self.target_fraction,
            self.seed,
        )
    }
}
