use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use pow_sim::prelude::*;
use research::{init_tracing, SweepArgs};

/// Growth rate, fork attack success, and selfish mining profit as the
/// adversary's share of the network increases.
#[derive(Debug, Parser)]
struct Cli {
    /// Nodes in the network
    #[arg(short, long, default_value_t = 100)]
    nodes: usize,

    /// Probability that a single node finds a block in one round
    #[arg(long, default_value_t = 0.001)]
    success_rate: f64,

    /// Fraction of honest power mining on the adversary's block during a tie,
    /// used by the closed-form revenue column
    #[arg(short, long, default_value_t = 0.0)]
    gamma: f64,

    #[command(flatten)]
    sweep: SweepArgs,
}

const MALICIOUS_RATIOS: [f64; 5] = [0.1, 0.2, 0.3, 0.4, 0.5];

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let start = Instant::now();

    let group = cli
        .sweep
        .apply(SimulationBuilder::new())
        .node_count(cli.nodes)
        .malicious_ratio_iter(MALICIOUS_RATIOS)
        .success_rate(cli.success_rate)
        .build()?;

    let results = cli
        .sweep
        .present(group.run_all()?)
        .all()
        .malicious_ratio_func(
            format!("Ideal SM Revenue (gamma={})", cli.gamma),
            selfish_revenue(cli.gamma),
        )
        .build();

    println!("{}", results);

    tracing::info!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}
