/*!
Monte Carlo model of block production and adversarial behavior in a
simplified proof-of-work network.

Three stochastic models are combined by [`Simulation`](simulation::Simulation):
- [`round`]: which class of node (if any) produces a block in one round
- [`fork_race`]: a biased random walk between an honest and a malicious chain
  tip, restarted whenever the malicious tip falls behind
- [`selfish`]: a coarse relative-revenue estimate for a selfish miner

Each run reduces its raw trial outcomes to a chain growth rate, a fork attack
success ratio, and a selfish mining profit ratio.

```
use pow_sim::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

let sim = Simulation::new(100, 0.1, 0.001).unwrap();
let mut rng = StdRng::seed_from_u64(7);
let output = sim.run_with_rng(1000, 1000, &mut rng).unwrap();

let (growth_rate, attack_success, selfish_profit) = output.ratios();
assert!((0.0..=1.0).contains(&growth_rate));
assert!((0.0..=1.0).contains(&attack_success));
assert!(selfish_profit >= 0.0);
```
*/

pub mod config;
pub mod fork_race;
pub mod prelude;
pub mod results;
pub mod round;
pub mod selfish;
pub mod simulation;

pub(crate) mod utils;
