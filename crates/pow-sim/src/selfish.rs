//! Selfish mining revenue estimates

use rand::Rng;

use crate::{config::Ratio, simulation::SimulationError};

/// Rounds sampled per selfish mining estimate.
pub const DEFAULT_SAMPLE_ROUNDS: usize = 1000;

/// Estimates the relative revenue of a selfish mining policy, against a
/// baseline of one unit of revenue per round.
///
/// In each round the adversary wins with probability `malicious_ratio` and
/// is credited 2 units, for a withheld block that later wins the race to a
/// two block lead. Otherwise the round is a tie, and the contested block is
/// credited 1 unit with probability 0.5.
///
/// Returns [`SimulationError::ZeroSampleRounds`] if `sample_rounds` is zero.
pub fn estimate_profit_ratio<R>(
    malicious_ratio: Ratio,
    sample_rounds: usize,
    rng: &mut R,
) -> Result<f64, SimulationError>
where
    R: Rng + ?Sized,
{
    if sample_rounds == 0 {
        return Err(SimulationError::ZeroSampleRounds);
    }

    let profits: u64 = (0..sample_rounds)
        .map(|_| {
            if rng.gen::<Ratio>() < malicious_ratio {
                2
            } else if rng.gen::<Ratio>() < 0.5 {
                1
            } else {
                0
            }
        })
        .sum();

    Ok(profits as f64 / sample_rounds as f64)
}

/// Returns the ideal selfish miner revenue function from Eyal and Sirer's
/// paper, as a function of the adversary's share of mining power. `gamma`
/// is the fraction of honest power which mines on the adversary's block
/// during a tie.
pub fn selfish_revenue(gamma: f64) -> impl Fn(Ratio) -> f64 {
    move |a: Ratio| -> f64 {
        (a * (1.0 - a).powi(2) * (4.0 * a + gamma * (1.0 - 2.0 * a))
            - a.powi(3))
            / (1.0 - a * (1.0 + a * (2.0 - a)))
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const SEED: u64 = 99;

    #[test]
    fn full_adversary_always_earns_two() {
        let mut rng = StdRng::seed_from_u64(SEED);
        assert_eq!(estimate_profit_ratio(1.0, 10_000, &mut rng), Ok(2.0));
    }

    #[test]
    fn zero_sample_rounds_rejected() {
        let mut rng = StdRng::seed_from_u64(SEED);
        assert_eq!(
            estimate_profit_ratio(0.3, 0, &mut rng),
            Err(SimulationError::ZeroSampleRounds)
        );
    }

    #[test]
    fn honest_network_earns_half_from_ties() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let ratio = estimate_profit_ratio(0.0, 100_000, &mut rng).unwrap();
        assert!((ratio - 0.5).abs() < 0.01, "{ratio}");
    }

    #[test]
    fn estimate_matches_expected_credit() {
        let mut rng = StdRng::seed_from_u64(SEED);
        // 0.1 * 2 + 0.9 * 0.5 * 1
        let ratio = estimate_profit_ratio(0.1, 100_000, &mut rng).unwrap();
        assert!((ratio - 0.65).abs() < 0.015, "{ratio}");
    }

    #[test]
    fn closed_form_break_even_at_one_third() {
        let revenue = selfish_revenue(0.0);
        assert!((revenue(1.0 / 3.0) - 1.0 / 3.0).abs() < 1e-12);
        assert!(revenue(0.4) > 0.4);
        assert!(revenue(0.2) < 0.2);
    }
}
