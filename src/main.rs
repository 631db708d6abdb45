use std::path::Path;
use std::time::Instant;
use clap::Parser;
use qpcut::algorithms::ProjectedGradientStep;
use qpcut::gen_weights::gen_random_weights;
use qpcut::io::{read_matrix_market_as_graph, write_projection_to_file};
use qpcut::Partition;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the .mtx file
    mtx_filepath: String,

    /// Filename where the projected point can be stored
    output_file: String,

    /// Share of the total vertex weight assigned to part 1
    #[arg(short, long, default_value_t = 0.5)]
    target_fraction: f64,

    /// Length of the gradient step
    #[arg(short, long, default_value_t = 0.5)]
    step_size: f64,

    /// Seed of the initial relaxation and of the random weights
    #[arg(long)]
    seed: Option<u64>,

    /// Draw vertex weights in [1, 3) instead of unit weights
    #[arg(short, long)]
    random_weights: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let graph = read_matrix_market_as_graph(Path::new(&args.mtx_filepath))?;
    let weights = args
        .random_weights
        .then(|| gen_random_weights(graph.len(), 1.0, 3.0, args.seed));
    info!(vertices = graph.len(), weighted = weights.is_some(), "graph loaded");

    let mut partition = vec![0; graph.len()];
    let start = Instant::now();
    let report = ProjectedGradientStep {
        step_size: args.step_size,
        target_fraction: args.target_fraction,
        seed: args.seed,
    }
    .partition(&mut partition, (&graph, weights.as_deref()))?;
    let elapsed_time = start.elapsed();

    write_projection_to_file(&report.relaxation, Path::new(&args.output_file))?;
    info!(
        lambda = report.lambda,
        rounds = report.stats.rounds,
        promotions = report.stats.promotions,
        heap_comparisons = report.stats.heap_comparisons,
        residual = report.residual,
        "projection"
    );
    info!(
        relaxed_cut_before = report.relaxed_cut_before,
        relaxed_cut_after = report.relaxed_cut_after,
        edge_cut = graph.edge_cut(&partition),
        ?elapsed_time,
        "partition"
    );
    Ok(())
}
