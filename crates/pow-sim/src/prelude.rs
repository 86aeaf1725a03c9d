/*!
Re-export of common values and datatypes

Must be imported manually.

```
use pow_sim::prelude::*;
```
*/

use crate::{config, fork_race, results, round, selfish, simulation};

pub use config::{ConfigError, NetworkConfig, Ratio};

pub use fork_race::{race_length, run_race, ForkRaceState};

pub use results::{Average, Format, ResultsBuilder, ResultsTable};

pub use round::{sample_round, BlockLottery, RoundOutcome};

pub use selfish::{estimate_profit_ratio, selfish_revenue};

pub use simulation::{
    Simulation, SimulationBuildError, SimulationBuilder, SimulationError,
    SimulationGroup, SimulationOutput, TrialStatistics,
};
