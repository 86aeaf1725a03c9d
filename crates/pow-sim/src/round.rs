//! Deciding which class of node, if any, produces the block of a round

use rand::Rng;

use crate::config::{NetworkConfig, Ratio};

/// Result of a single simulated round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundOutcome {
    /// No node found a block.
    NoBlock,
    /// An honest node found the block.
    HonestBlock,
    /// A malicious node found the block.
    MaliciousBlock,
}

impl RoundOutcome {
    /// Returns true if a block was produced this round.
    #[inline]
    pub fn is_block(&self) -> bool {
        !matches!(self, Self::NoBlock)
    }
}

/// Determines how the winner of a round is drawn.
///
/// Both variants produce a block with probability
/// `1 - (1 - success_rate)^node_count`, and a produced block is malicious
/// with probability `malicious_node_count / node_count`, up to the
/// `success_rate = 1.0` corner case described on [`BlockLottery::PerNode`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BlockLottery {
    /// Every node makes one independent attempt, in slot order, with the
    /// malicious slots checked first. The first node whose draw is below the
    /// success rate wins the round. With a success rate of `1.0` slot 0
    /// always wins.
    #[default]
    PerNode,
    /// One draw decides whether any block is found, and a second draw picks
    /// the winning class in proportion to its node count.
    Aggregate,
}

impl BlockLottery {
    /// Samples the outcome of one round on the network described by
    /// `config`.
    pub fn sample<R>(&self, config: &NetworkConfig, rng: &mut R) -> RoundOutcome
    where
        R: Rng + ?Sized,
    {
        let success_rate = config.success_rate();
        let malicious = config.malicious_node_count();

        match self {
            Self::PerNode => {
                for slot in 0..config.node_count() {
                    if rng.gen::<Ratio>() < success_rate {
                        return if slot < malicious {
                            RoundOutcome::MaliciousBlock
                        } else {
                            RoundOutcome::HonestBlock
                        };
                    }
                }

                RoundOutcome::NoBlock
            }
            Self::Aggregate => {
                let n = config.node_count() as Ratio;
                let block_prob = 1.0 - (1.0 - success_rate).powf(n);

                if rng.gen::<Ratio>() >= block_prob {
                    RoundOutcome::NoBlock
                } else if rng.gen::<Ratio>() < malicious as Ratio / n {
                    RoundOutcome::MaliciousBlock
                } else {
                    RoundOutcome::HonestBlock
                }
            }
        }
    }
}

/// Samples one round using [`BlockLottery::PerNode`].
#[inline]
pub fn sample_round<R>(config: &NetworkConfig, rng: &mut R) -> RoundOutcome
where
    R: Rng + ?Sized,
{
    BlockLottery::PerNode.sample(config, rng)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const SEED: u64 = 0x5eed;

    #[test]
    fn zero_success_rate_never_produces_blocks() {
        let config = NetworkConfig::new(100, 0.3, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(SEED);

        for lottery in [BlockLottery::PerNode, BlockLottery::Aggregate] {
            for _ in 0..1000 {
                assert!(!lottery.sample(&config, &mut rng).is_block());
            }
        }
    }

    #[test]
    fn certain_success_goes_to_first_slot() {
        let mut rng = StdRng::seed_from_u64(SEED);

        let config = NetworkConfig::new(100, 0.1, 1.0).unwrap();
        for _ in 0..1000 {
            assert_eq!(
                sample_round(&config, &mut rng),
                RoundOutcome::MaliciousBlock
            );
        }

        let config = NetworkConfig::new(100, 0.0, 1.0).unwrap();
        for _ in 0..1000 {
            assert_eq!(
                sample_round(&config, &mut rng),
                RoundOutcome::HonestBlock
            );
        }
    }

    #[test]
    fn lotteries_agree_on_marginals() {
        const ROUNDS: usize = 100_000;

        let config = NetworkConfig::new(100, 0.1, 0.001).unwrap();
        let expected_block = 1.0 - 0.999f64.powi(100);

        for lottery in [BlockLottery::PerNode, BlockLottery::Aggregate] {
            let mut rng = StdRng::seed_from_u64(SEED);
            let (mut blocks, mut malicious) = (0usize, 0usize);

            for _ in 0..ROUNDS {
                match lottery.sample(&config, &mut rng) {
                    RoundOutcome::NoBlock => (),
                    RoundOutcome::HonestBlock => blocks += 1,
                    RoundOutcome::MaliciousBlock => {
                        blocks += 1;
                        malicious += 1;
                    }
                }
            }

            let block_rate = blocks as f64 / ROUNDS as f64;
            let malicious_share = malicious as f64 / blocks as f64;

            assert!(
                (block_rate - expected_block).abs() < 0.006,
                "{lottery:?}: block rate {block_rate}"
            );
            assert!(
                (malicious_share - 0.1).abs() < 0.02,
                "{lottery:?}: malicious share {malicious_share}"
            );
        }
    }
}
