//! Fork race between an honest and a malicious chain tip.
//!
//! Every round of a race produces exactly one block, won by the adversary
//! with probability equal to its share of the network. The per-node success
//! rate plays no part here, which keeps races bounded by their round budget.

use rand::Rng;

use crate::config::Ratio;

/// Lead the adversary needs over the honest chain for a fork attack to
/// count as successful.
pub const DEFAULT_TARGET_LEAD_MARGIN: usize = 6;

/// Block counts of the two competing tips since the fork began.
///
/// # Invariants
/// `malicious_lead >= honest_lead`. States are only created through
/// [`Default`] and changed through [`ForkRaceState::advance`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForkRaceState {
    honest_lead: usize,
    malicious_lead: usize,
}

impl ForkRaceState {
    /// Credits the next block to one side. If the malicious tip falls behind,
    /// its fork is abandoned and both counters restart from zero.
    pub fn advance(&mut self, malicious_won: bool) {
        if malicious_won {
            self.malicious_lead += 1;
        } else {
            self.honest_lead += 1;
        }

        if self.malicious_lead < self.honest_lead {
            *self = Self::default();
        }
    }

    #[inline]
    pub fn honest_lead(&self) -> usize {
        self.honest_lead
    }

    #[inline]
    pub fn malicious_lead(&self) -> usize {
        self.malicious_lead
    }

    /// Number of blocks by which the malicious tip is ahead.
    #[inline]
    pub fn lead(&self) -> usize {
        self.malicious_lead - self.honest_lead
    }
}

/// Runs a single fork race. Returns the 1-based round in which the malicious
/// tip first leads by exactly `target_lead_margin` blocks, or `None` if
/// `max_rounds` pass without that happening.
pub fn race_length<R>(
    malicious_ratio: Ratio,
    target_lead_margin: usize,
    max_rounds: usize,
    rng: &mut R,
) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let mut state = ForkRaceState::default();

    for round in 1..=max_rounds {
        state.advance(rng.gen::<Ratio>() < malicious_ratio);

        if state.malicious_lead == state.honest_lead + target_lead_margin {
            tracing::trace!(round, ?state, "fork race won by adversary");
            return Some(round);
        }
    }

    None
}

/// Runs a single fork race, returning true if the adversary reaches the
/// target lead within the round budget.
///
/// ```
/// use pow_sim::fork_race::run_race;
///
/// // An adversary holding the whole network wins in exactly 6 rounds
/// let mut rng = rand::thread_rng();
/// assert!(run_race(1.0, 6, 6, &mut rng));
/// assert!(!run_race(1.0, 6, 5, &mut rng));
/// ```
#[inline]
pub fn run_race<R>(
    malicious_ratio: Ratio,
    target_lead_margin: usize,
    max_rounds: usize,
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    race_length(malicious_ratio, target_lead_margin, max_rounds, rng).is_some()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    const SEED: u64 = 2024;

    #[test]
    fn falling_behind_resets_race() {
        let mut state = ForkRaceState::default();
        state.advance(true);
        state.advance(true);
        assert_eq!(state.lead(), 2);

        state.advance(false);
        state.advance(false);
        assert_eq!((state.honest_lead(), state.malicious_lead()), (2, 2));
        assert_eq!(state.lead(), 0);

        state.advance(false);
        assert_eq!(state, ForkRaceState::default());
    }

    #[test]
    fn honest_blocks_never_leave_malicious_tip_behind() {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut state = ForkRaceState::default();

        // An honest block from parity restarts the race instead of leaving
        // the adversary one block behind.
        state.advance(false);
        assert_eq!(state, ForkRaceState::default());
        assert_eq!(state.lead(), 0);

        for _ in 0..10_000 {
            state.advance(rng.gen_bool(0.4));
            assert!(state.malicious_lead() >= state.honest_lead());
            assert_eq!(
                state.lead(),
                state.malicious_lead() - state.honest_lead()
            );
        }
    }

    #[test]
    fn honest_network_never_loses_race() {
        let mut rng = StdRng::seed_from_u64(SEED);
        for margin in 1..=6 {
            for _ in 0..200 {
                assert!(!run_race(0.0, margin, 1000, &mut rng));
            }
        }
    }

    #[test]
    fn malicious_network_wins_in_margin_rounds() {
        let mut rng = StdRng::seed_from_u64(SEED);
        for margin in 1..=10 {
            assert_eq!(race_length(1.0, margin, 1000, &mut rng), Some(margin));
            assert!(!run_race(1.0, margin, margin - 1, &mut rng));
        }
    }

    #[test]
    fn success_grows_with_malicious_ratio() {
        const TRIALS: usize = 1000;

        let mut rng = StdRng::seed_from_u64(SEED);
        let mut wins = |ratio: Ratio| {
            let margin = DEFAULT_TARGET_LEAD_MARGIN;
            (0..TRIALS)
                .filter(|_| run_race(ratio, margin, 1000, &mut rng))
                .count()
        };

        let low = wins(0.1);
        let mid = wins(0.3);
        let high = wins(0.5);

        assert!(low < mid, "{low} >= {mid}");
        assert!(mid < high, "{mid} >= {high}");
        assert!(low <= TRIALS / 100);
    }
}
