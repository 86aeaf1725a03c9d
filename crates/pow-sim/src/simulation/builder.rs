use std::num::NonZeroUsize;

use crate::{
    config::{ConfigError, NetworkConfig, Ratio},
    round::BlockLottery,
};

use super::{
    Simulation, SimulationError, SimulationGroup, DEFAULT_ATTACK_ROUNDS,
    DEFAULT_ROUNDS,
};

/// Builds a [`SimulationGroup`] over every combination of the given malicious
/// ratios and success rates.
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    pub node_count: Option<usize>,
    pub malicious_ratios: Vec<Ratio>,
    pub success_rates: Vec<Ratio>,
    pub rounds: Option<usize>,
    pub attack_rounds: Option<usize>,
    pub repeat_all: Option<usize>,
    pub seed: Option<u64>,
    target_lead_margin: Option<usize>,
    selfish_sample_rounds: Option<usize>,
    lottery: BlockLottery,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("node count was not set")]
    NodeCountNotSet,
    #[error("no malicious ratios were given")]
    NoMaliciousRatios,
    #[error("no success rates were given")]
    NoSuccessRates,
    #[error("cannot repeat each simulation 0 times")]
    RepeatAllZero,
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error(transparent)]
    SimulationError(#[from] SimulationError),
}

impl SimulationBuilder {
    /// Creates a new [`SimulationBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of nodes in every simulated network.
    pub fn node_count(mut self, node_count: usize) -> Self {
        self.node_count = Some(node_count);

        self
    }

    /// Adds a malicious ratio to simulate.
    pub fn malicious_ratio(mut self, ratio: Ratio) -> Self {
        self.malicious_ratios.push(ratio);

        self
    }

    /// Call [`SimulationBuilder::malicious_ratio`] once for each element of
    /// `ratios`.
    pub fn malicious_ratio_iter<I>(mut self, ratios: I) -> Self
    where
        I: IntoIterator<Item = Ratio>,
    {
        self.malicious_ratios.extend(ratios);

        self
    }

    /// Adds a per-node success rate to simulate.
    pub fn success_rate(mut self, rate: Ratio) -> Self {
        self.success_rates.push(rate);

        self
    }

    /// Call [`SimulationBuilder::success_rate`] once for each element of
    /// `rates`.
    pub fn success_rate_iter<I>(mut self, rates: I) -> Self
    where
        I: IntoIterator<Item = Ratio>,
    {
        self.success_rates.extend(rates);

        self
    }

    /// Sets the number of growth-rate rounds and fork races per run
    /// (default 1000).
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);

        self
    }

    /// Sets the round budget of each fork race (default 1000).
    pub fn attack_rounds(mut self, rounds: usize) -> Self {
        self.attack_rounds = Some(rounds);

        self
    }

    /// Each simulation will be run `num` times (default 1).
    pub fn repeat_all(mut self, num: usize) -> Self {
        self.repeat_all = Some(num);

        self
    }

    /// Makes every run of the group reproducible from `seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);

        self
    }

    /// Sets the lead the adversary needs to win a fork race (default 6).
    pub fn target_lead_margin(mut self, margin: usize) -> Self {
        self.target_lead_margin = Some(margin);

        self
    }

    /// Sets the number of rounds per selfish mining estimate (default 1000).
    pub fn selfish_sample_rounds(mut self, rounds: usize) -> Self {
        self.selfish_sample_rounds = Some(rounds);

        self
    }

    /// Sets how round winners are drawn.
    pub fn lottery(mut self, lottery: BlockLottery) -> Self {
        self.lottery = lottery;

        self
    }

    /// Creates a [`SimulationGroup`] from the specified parameters.
    pub fn build(self) -> Result<SimulationGroup, SimulationBuildError> {
        let SimulationBuilder {
            node_count,
            malicious_ratios,
            success_rates,
            rounds,
            attack_rounds,
            repeat_all,
            seed,
            target_lead_margin,
            selfish_sample_rounds,
            lottery,
        } = self;

        let node_count =
            node_count.ok_or(SimulationBuildError::NodeCountNotSet)?;
        if malicious_ratios.is_empty() {
            return Err(SimulationBuildError::NoMaliciousRatios);
        }
        if success_rates.is_empty() {
            return Err(SimulationBuildError::NoSuccessRates);
        }

        let repeat_all = match repeat_all {
            Some(x) => NonZeroUsize::new(x)
                .ok_or(SimulationBuildError::RepeatAllZero)?,
            None => NonZeroUsize::MIN,
        };
        let rounds = NonZeroUsize::new(rounds.unwrap_or(DEFAULT_ROUNDS))
            .ok_or(SimulationError::ZeroRounds)?;
        let attack_rounds =
            NonZeroUsize::new(attack_rounds.unwrap_or(DEFAULT_ATTACK_ROUNDS))
                .ok_or(SimulationError::ZeroAttackRounds)?;

        let mut simulations = vec![];
        for &malicious_ratio in &malicious_ratios {
            for &success_rate in &success_rates {
                let config = NetworkConfig::new(
                    node_count,
                    malicious_ratio,
                    success_rate,
                )?;

                let mut sim =
                    Simulation::from_config(config).with_lottery(lottery);
                if let Some(margin) = target_lead_margin {
                    sim = sim.with_target_lead_margin(margin);
                }
                if let Some(samples) = selfish_sample_rounds {
                    sim = sim.with_selfish_sample_rounds(samples);
                }
                sim.validate(rounds.get(), attack_rounds.get())?;

                simulations.push(sim);
            }
        }

        Ok(SimulationGroup {
            simulations,
            rounds,
            attack_rounds,
            repeat_all,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimulationBuilder {
        SimulationBuilder::new()
            .node_count(100)
            .malicious_ratio(0.1)
            .success_rate(0.001)
    }

    #[test]
    fn example_build() {
        let group = base()
            .malicious_ratio_iter([0.2, 0.3])
            .repeat_all(3)
            .build()
            .expect("valid simulation build");

        assert_eq!(group.num_runs(), 9);
    }

    #[test]
    fn missing_parameters_rejected() {
        use SimulationBuildError::*;

        let err = SimulationBuilder::new().malicious_ratio(0.1).build();
        assert_eq!(err.unwrap_err(), NodeCountNotSet);

        let err = SimulationBuilder::new().node_count(10).success_rate(0.1);
        assert_eq!(err.build().unwrap_err(), NoMaliciousRatios);

        let err = SimulationBuilder::new().node_count(10).malicious_ratio(0.1);
        assert_eq!(err.build().unwrap_err(), NoSuccessRates);

        assert_eq!(base().repeat_all(0).build().unwrap_err(), RepeatAllZero);
    }

    #[test]
    fn invalid_values_rejected() {
        assert_eq!(
            base().rounds(0).build().unwrap_err(),
            SimulationBuildError::from(SimulationError::ZeroRounds)
        );
        assert_eq!(
            base().attack_rounds(0).build().unwrap_err(),
            SimulationBuildError::from(SimulationError::ZeroAttackRounds)
        );
        assert_eq!(
            base().selfish_sample_rounds(0).build().unwrap_err(),
            SimulationBuildError::from(SimulationError::ZeroSampleRounds)
        );
        assert_eq!(
            base().target_lead_margin(0).build().unwrap_err(),
            SimulationBuildError::from(SimulationError::ZeroTargetLead)
        );
        assert_eq!(
            base().malicious_ratio(2.0).build().unwrap_err(),
            SimulationBuildError::from(ConfigError::BadMaliciousRatio(2.0))
        );
    }
}
