use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use pow_sim::prelude::*;
use research::{init_tracing, SweepArgs};

/// Chain growth rate as the per-node success rate increases.
#[derive(Debug, Parser)]
struct Cli {
    /// Nodes in the network
    #[arg(short, long, default_value_t = 100)]
    nodes: usize,

    /// Fraction of nodes controlled by the adversary
    #[arg(short, long, default_value_t = 0.1)]
    malicious_ratio: f64,

    #[command(flatten)]
    sweep: SweepArgs,
}

const SUCCESS_RATES: [f64; 4] = [5e-4, 1e-3, 5e-3, 1e-2];

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let start = Instant::now();

    let group = cli
        .sweep
        .apply(SimulationBuilder::new())
        .node_count(cli.nodes)
        .malicious_ratio(cli.malicious_ratio)
        .success_rate_iter(SUCCESS_RATES)
        .build()?;

    let results = cli.sweep.present(group.run_all()?).growth_rate().build();

    println!("{}", results);

    tracing::info!("elapsed time: {:.4} secs", start.elapsed().as_secs_f64());
    Ok(())
}
