//! Shared command line handling for the parameter sweep binaries.

use clap::Args;
use pow_sim::prelude::*;
use tracing_subscriber::EnvFilter;

/// Options common to every sweep.
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Growth-rate rounds and fork races per simulation run
    #[arg(long, default_value_t = 1000)]
    pub rounds: usize,

    /// Round budget of a single fork race
    #[arg(long, default_value_t = 1000)]
    pub attack_rounds: usize,

    /// Number of runs averaged into each row
    #[arg(short, long, default_value_t = 1)]
    pub repeat: usize,

    /// Seed for reproducible output
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Print comma-separated values instead of an aligned table
    #[arg(long)]
    pub csv: bool,
}

impl SweepArgs {
    /// Applies these options to `builder`.
    pub fn apply(&self, builder: SimulationBuilder) -> SimulationBuilder {
        let builder = builder
            .rounds(self.rounds)
            .attack_rounds(self.attack_rounds)
            .repeat_all(self.repeat);

        match self.seed {
            Some(seed) => builder.seed(seed),
            None => builder,
        }
    }

    /// Applies the averaging and output format options to `results`.
    pub fn present(&self, results: ResultsBuilder) -> ResultsBuilder {
        let results = match self.repeat {
            1 => results,
            _ => results.average(Average::Mean),
        };

        results.format(if self.csv {
            Format::CSV
        } else {
            Format::PrettyPrint
        })
    }
}

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(repeat: usize, csv: bool) -> SweepArgs {
        SweepArgs { rounds: 50, attack_rounds: 20, repeat, seed: Some(3), csv }
    }

    fn table(args: &SweepArgs) -> String {
        let group = args
            .apply(SimulationBuilder::new())
            .node_count(10)
            .malicious_ratio_iter([0.1, 0.2])
            .success_rate(0.05)
            .build()
            .unwrap();

        args.present(group.run_all().unwrap())
            .growth_rate()
            .build()
            .to_string()
    }

    #[test]
    fn single_runs_are_not_averaged() {
        let csv = table(&args(1, true));
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(!header.contains("Mean Of"), "{header}");
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn repeated_runs_are_averaged_by_mean() {
        let csv = table(&args(4, true));
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.contains("Mean Of"), "{header}");
        // one row per configuration, each averaging 4 runs
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn options_applied_to_group() {
        let group = args(3, false)
            .apply(SimulationBuilder::new())
            .node_count(10)
            .malicious_ratio(0.1)
            .success_rate(0.05)
            .build()
            .unwrap();
        assert_eq!(group.num_runs(), 3);

        let data = group.run_all().unwrap().data();
        assert!(data.iter().all(|o| o.rounds == 50 && o.attack_rounds == 20));
    }

    #[test]
    fn pretty_print_unless_csv() {
        let pretty = table(&args(1, false));
        assert!(pretty.contains('|'));

        let csv = table(&args(1, true));
        assert!(!csv.contains('|'));
    }
}
