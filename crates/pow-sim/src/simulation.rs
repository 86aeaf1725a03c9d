//! Running simulations and reducing their trials to summary statistics

use std::num::NonZeroUsize;

use rand::{rngs::StdRng, Rng, SeedableRng};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    config::{ConfigError, NetworkConfig, Ratio},
    fork_race::{self, DEFAULT_TARGET_LEAD_MARGIN},
    results::ResultsBuilder,
    round::{BlockLottery, RoundOutcome},
    selfish::{self, DEFAULT_SAMPLE_ROUNDS},
};

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder};

/// Default number of growth-rate rounds and fork race trials per run.
pub const DEFAULT_ROUNDS: usize = 1000;

/// Default round budget of a single fork race.
pub const DEFAULT_ATTACK_ROUNDS: usize = 1000;

/// A simulation of block production on a single network configuration.
///
/// # Details
/// Each call to [`Simulation::run`] starts from fresh counters:
/// 1. `rounds` rounds are sampled, and the fraction which produced a block is
///    the growth rate.
/// 2. `rounds` independent fork races are run, each with a budget of
///    `attack_rounds` rounds, and the fraction the adversary won is the
///    attack success ratio.
/// 3. One selfish mining estimate is taken over
///    [`selfish_sample_rounds`](Self::with_selfish_sample_rounds) rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    config: NetworkConfig,
    lottery: BlockLottery,
    selfish_sample_rounds: usize,
    target_lead_margin: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("number of simulation rounds must be greater than 0")]
    ZeroRounds,
    #[error("fork race round budget must be greater than 0")]
    ZeroAttackRounds,
    #[error("fork race target lead must be greater than 0")]
    ZeroTargetLead,
    #[error("selfish mining estimate needs at least 1 sample round")]
    ZeroSampleRounds,
}

/// Raw counters accumulated over a single run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TrialStatistics {
    /// Rounds in which any block was produced.
    pub blocks_produced: usize,
    pub honest_blocks: usize,
    pub malicious_blocks: usize,
    /// Fork races won by the adversary.
    pub successful_attacks: usize,
    /// Sum of the selfish mining estimates taken during the run.
    pub selfish_profit_sum: f64,
}

/// Contains the output data from a [`Simulation`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub config: NetworkConfig,
    pub rounds: usize,
    pub attack_rounds: usize,
    pub target_lead_margin: usize,
    pub stats: TrialStatistics,
    /// Fraction of rounds which produced a block.
    pub growth_rate: f64,
    /// Fraction of fork races won by the adversary.
    pub attack_success_ratio: f64,
    pub selfish_profit_ratio: f64,
}

impl SimulationOutput {
    /// Returns `(growth_rate, attack_success_ratio, selfish_profit_ratio)`.
    pub fn ratios(&self) -> (f64, f64, f64) {
        (
            self.growth_rate,
            self.attack_success_ratio,
            self.selfish_profit_ratio,
        )
    }

    /// Fraction of produced blocks which were mined by malicious nodes, or
    /// `0.0` if no blocks were produced.
    pub fn malicious_block_share(&self) -> f64 {
        match self.stats.blocks_produced {
            0 => 0.0,
            n => self.stats.malicious_blocks as f64 / n as f64,
        }
    }
}

impl Simulation {
    /// Creates a [`Simulation`] for a network of `node_count` nodes.
    pub fn new(
        node_count: usize,
        malicious_ratio: Ratio,
        success_rate: Ratio,
    ) -> Result<Self, ConfigError> {
        let config =
            NetworkConfig::new(node_count, malicious_ratio, success_rate)?;

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: NetworkConfig) -> Self {
        Self {
            config,
            lottery: BlockLottery::default(),
            selfish_sample_rounds: DEFAULT_SAMPLE_ROUNDS,
            target_lead_margin: DEFAULT_TARGET_LEAD_MARGIN,
        }
    }

    /// Sets how round winners are drawn (default [`BlockLottery::PerNode`]).
    pub fn with_lottery(mut self, lottery: BlockLottery) -> Self {
        self.lottery = lottery;

        self
    }

    /// Sets the number of rounds sampled by the selfish mining estimate
    /// (default 1000).
    pub fn with_selfish_sample_rounds(mut self, rounds: usize) -> Self {
        self.selfish_sample_rounds = rounds;

        self
    }

    /// Sets the lead the adversary needs to win a fork race (default 6).
    pub fn with_target_lead_margin(mut self, margin: usize) -> Self {
        self.target_lead_margin = margin;

        self
    }

    #[inline]
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Checks that a run with the given round counts can produce finite
    /// ratios.
    pub fn validate(
        &self,
        rounds: usize,
        attack_rounds: usize,
    ) -> Result<(), SimulationError> {
        use SimulationError::*;

        if rounds == 0 {
            return Err(ZeroRounds);
        }
        if attack_rounds == 0 {
            return Err(ZeroAttackRounds);
        }
        if self.target_lead_margin == 0 {
            return Err(ZeroTargetLead);
        }
        if self.selfish_sample_rounds == 0 {
            return Err(ZeroSampleRounds);
        }

        Ok(())
    }

    /// Executes the simulation using an entropy-seeded random source.
    pub fn run(
        &self,
        rounds: usize,
        attack_rounds: usize,
    ) -> Result<SimulationOutput, SimulationError> {
        self.run_with_rng(rounds, attack_rounds, &mut StdRng::from_entropy())
    }

    /// Executes the simulation reproducibly from `seed`.
    pub fn run_seeded(
        &self,
        rounds: usize,
        attack_rounds: usize,
        seed: u64,
    ) -> Result<SimulationOutput, SimulationError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.run_with_rng(rounds, attack_rounds, &mut rng)
    }

    /// Executes the simulation, drawing all randomness from `rng`.
    pub fn run_with_rng<R>(
        &self,
        rounds: usize,
        attack_rounds: usize,
        rng: &mut R,
    ) -> Result<SimulationOutput, SimulationError>
    where
        R: Rng + ?Sized,
    {
        self.validate(rounds, attack_rounds)?;

        let config = self.config;
        tracing::debug!(
            node_count = config.node_count(),
            malicious_ratio = config.malicious_ratio(),
            success_rate = config.success_rate(),
            rounds,
            attack_rounds,
            "running simulation"
        );

        let mut stats = TrialStatistics::default();

        for _ in 0..rounds {
            match self.lottery.sample(&config, rng) {
                RoundOutcome::NoBlock => (),
                RoundOutcome::HonestBlock => stats.honest_blocks += 1,
                RoundOutcome::MaliciousBlock => stats.malicious_blocks += 1,
            }
        }
        stats.blocks_produced = stats.honest_blocks + stats.malicious_blocks;

        for _ in 0..rounds {
            if fork_race::run_race(
                config.malicious_ratio(),
                self.target_lead_margin,
                attack_rounds,
                rng,
            ) {
                stats.successful_attacks += 1;
            }
        }

        stats.selfish_profit_sum += selfish::estimate_profit_ratio(
            config.malicious_ratio(),
            self.selfish_sample_rounds,
            rng,
        )?;

        let output = SimulationOutput {
            config,
            rounds,
            attack_rounds,
            target_lead_margin: self.target_lead_margin,
            stats,
            growth_rate: stats.blocks_produced as f64 / rounds as f64,
            attack_success_ratio: stats.successful_attacks as f64
                / rounds as f64,
            selfish_profit_ratio: stats.selfish_profit_sum,
        };

        tracing::debug!(
            growth_rate = output.growth_rate,
            attack_success_ratio = output.attack_success_ratio,
            selfish_profit_ratio = output.selfish_profit_ratio,
            "simulation finished"
        );

        Ok(output)
    }
}

/// Container for a group of simulations which share the same trial counts.
/// Simulations should be run using this struct's `run_all` method.
#[derive(Debug, Clone)]
pub struct SimulationGroup {
    simulations: Vec<Simulation>,
    rounds: NonZeroUsize,
    attack_rounds: NonZeroUsize,
    repeat_all: NonZeroUsize,
    seed: Option<u64>,
}

impl SimulationGroup {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Number of simulation runs performed by [`SimulationGroup::run_all`].
    pub fn num_runs(&self) -> usize {
        self.simulations.len() * self.repeat_all.get()
    }

    /// Runs every simulation in the group `repeat_all` times. When the group
    /// is seeded, run `i` draws from a random source seeded with `seed + i`,
    /// so results do not depend on scheduling.
    pub fn run_all(self) -> Result<ResultsBuilder, SimulationError> {
        let SimulationGroup {
            simulations,
            rounds,
            attack_rounds,
            repeat_all,
            seed,
        } = self;

        tracing::info!(
            configurations = simulations.len(),
            repeat_all = repeat_all.get(),
            rounds = rounds.get(),
            attack_rounds = attack_rounds.get(),
            "running simulation group"
        );

        let sims: Vec<_> = simulations
            .into_iter()
            // Clone each simulation repeat_all times
            .flat_map(|sim| vec![sim; repeat_all.get()])
            .enumerate()
            .collect();

        let run = |(i, sim): (usize, Simulation)| {
            let mut rng = match seed {
                Some(seed) => {
                    StdRng::seed_from_u64(seed.wrapping_add(i as u64))
                }
                None => StdRng::from_entropy(),
            };
            sim.run_with_rng(rounds.get(), attack_rounds.get(), &mut rng)
        };

        #[cfg(feature = "rayon")]
        let outputs: Result<Vec<_>, _> =
            sims.into_par_iter().map(run).collect();
        #[cfg(not(feature = "rayon"))]
        let outputs: Result<Vec<_>, _> = sims.into_iter().map(run).collect();

        Ok(ResultsBuilder::new(outputs?, repeat_all))
    }
}
