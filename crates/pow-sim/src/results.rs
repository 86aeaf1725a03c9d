/*!
Control the appearance of simulation result data

# Working with [`ResultsBuilder`]

## Examples

Creating a [`ResultsTable`] after running a simulation group:

```
use pow_sim::prelude::*;

let group = SimulationBuilder::new()
    .node_count(100)
    .malicious_ratio_iter([0.1, 0.3])
    .success_rate(0.001)
    .rounds(200)
    .attack_rounds(200)
    .repeat_all(5)
    .build()
    .unwrap();

let results_builder = group.run_all().unwrap();

let results = results_builder
    .average(Average::Median) // Median of each configuration's repeated runs
    .all()                    // Include every statistic and the round counts
    .format(Format::CSV)      // Output results as CSV
    .build();

println!("{}", results);
```
*/

use std::{collections::BTreeSet, fmt::Display, num::NonZeroUsize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    config::Ratio,
    simulation::SimulationOutput,
    utils::{wrap, WrapFunc},
};

/// Floating point precision of results data.
pub const FLOAT_PRECISION_DIGITS: usize = 6;

/// Builder for [`ResultsTable`]. Typically produced by running a
/// [`SimulationGroup`](crate::simulation::SimulationGroup).
#[derive(Debug, Clone)]
pub struct ResultsBuilder {
    average: Average,
    columns: BTreeSet<Column>,
    data: Vec<SimulationOutput>,
    format: Format,
    repeated: NonZeroUsize,
}

/// Describes the appearance of a [`ResultsTable`] table as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated, without extra whitespace.
    CSV,
    /// Human-readable.
    #[default]
    PrettyPrint,
}

impl ResultsBuilder {
    /// Create a new [`ResultsBuilder`].
    pub(crate) fn new(
        data: Vec<SimulationOutput>,
        repeated: NonZeroUsize,
    ) -> Self {
        Self {
            data,
            repeated,
            average: Average::default(),
            columns: BTreeSet::default(),
            format: Format::default(),
        }
    }

    /// Include the "Growth Rate", "Malicious Block Share",
    /// "Attack Success Ratio", "Selfish Profit Ratio", "Simulated Rounds" and
    /// "Attack Rounds" columns.
    ///
    /// [`ResultsBuilder::average`] must still be called separately
    /// to create averaged data.
    pub fn all(self) -> Self {
        self.growth_rate()
            .malicious_block_share()
            .attack_success()
            .selfish_profit()
            .rounds()
    }

    /// Average the results of repeated simulations based on the given
    /// [`Average`] type. For types other than [`Average::None`], a column
    /// describing the averaging method will be included in the results table.
    pub fn average(mut self, average: Average) -> Self {
        self.average = average;

        self
    }

    /// Include the "Attack Success Ratio" column in the results table.
    pub fn attack_success(mut self) -> Self {
        self.columns.insert(Column::AttackSuccess);

        self
    }

    /// Include a column with title `title` which only contains the given
    /// value.
    pub fn constant<T>(mut self, title: T, value: f64) -> Self
    where
        T: Into<String>,
    {
        self.columns.insert(Column::Constant(wrap!(title, move |_| value)));

        self
    }

    /// Extract the raw [`SimulationOutput`] data from this [`ResultsBuilder`].
    /// Useful for running custom statistical analysis.
    ///
    /// # Ordering
    /// Configurations appear in malicious-ratio-major order, as specified
    /// with [`SimulationBuilder`](crate::simulation::SimulationBuilder), with
    /// repeated runs being grouped together.
    pub fn data(self) -> Vec<SimulationOutput> {
        self.data
    }

    /// Include the "Growth Rate" column in the results table.
    pub fn growth_rate(mut self) -> Self {
        self.columns.insert(Column::GrowthRate);

        self
    }

    /// Include the "Malicious Block Share" column in the results table.
    pub fn malicious_block_share(mut self) -> Self {
        self.columns.insert(Column::MaliciousBlockShare);

        self
    }

    /// Use the malicious ratio of each simulation as input to `func`, and
    /// present the output in a table column with the given title.
    pub fn malicious_ratio_func<T, F>(mut self, title: T, func: F) -> Self
    where
        T: Into<String>,
        F: Fn(Ratio) -> f64 + Send + Sync + 'static,
    {
        self.columns
            .insert(Column::MaliciousRatioFunction(wrap!(title, func)));

        self
    }

    /// Include the "Simulated Rounds" and "Attack Rounds" columns in the
    /// results table.
    pub fn rounds(mut self) -> Self {
        self.columns.insert(Column::Rounds);
        self.columns.insert(Column::AttackRounds);

        self
    }

    /// Include the "Selfish Profit Ratio" column in the results table.
    pub fn selfish_profit(mut self) -> Self {
        self.columns.insert(Column::SelfishProfit);

        self
    }

    /// Specify the [`Format`] of the results table.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;

        self
    }

    /// Create new [`ResultsTable`].
    pub fn build(self) -> ResultsTable {
        let ResultsBuilder { average, mut columns, data, format, repeated } =
            self;

        columns.insert(Column::NodeCount);
        columns.insert(Column::MaliciousRatio);
        columns.insert(Column::SuccessRate);

        if average != Average::None {
            columns.insert(Column::AverageOf(average));
        }

        let columns = Vec::from_iter(columns);
        let rows = match average {
            Average::None => data
                .iter()
                .map(|output| {
                    #[cfg(feature = "rayon")]
                    let iter = columns.par_iter();
                    #[cfg(not(feature = "rayon"))]
                    let iter = columns.iter();

                    iter.map(|col_type| col_type.get_value(output)).collect()
                })
                .collect(),
            _ => data
                .chunks(repeated.get())
                .map(|outputs| {
                    #[cfg(feature = "rayon")]
                    let iter = columns.par_iter();
                    #[cfg(not(feature = "rayon"))]
                    let iter = columns.iter();

                    iter.map(|col_type| {
                        col_type.get_average_value(average, outputs)
                    })
                    .collect()
                })
                .collect(),
        };

        ResultsTable { columns, format, rows }
    }
}

/// Formatted results from the completion of a
/// [`SimulationGroup`](crate::simulation::SimulationGroup). The results table
/// is given by the struct's [`Display`] implementation, as specified by
/// its [`Format`].
#[derive(Debug)]
pub struct ResultsTable {
    columns: Vec<Column>,
    format: Format,
    rows: Vec<Vec<ColumnValue>>,
}

impl ResultsTable {
    const SEPARATOR_VERTICAL: char = '|';
    const SEPARATOR_HORIZONTAL: char = '-';

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    /// Number of data rows, excluding the title row.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

impl Display for ResultsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let titles: Vec<_> =
            self.columns.iter().map(|col_type| col_type.to_string()).collect();

        match self.format {
            Format::CSV => {
                write!(f, "{}", titles.join(","))?;

                for row in self.rows.iter() {
                    writeln!(f)?;

                    let row: Vec<_> =
                        row.iter().map(|val| val.to_string()).collect();

                    write!(f, "{}", row.join(","))?;
                }
            }
            Format::PrettyPrint => {
                let mut text_widths: Vec<_> =
                    titles.iter().map(|title| title.len()).collect();

                for row in self.rows.iter() {
                    for (i, val) in row.iter().enumerate() {
                        let val = val.to_string();
                        text_widths[i] = text_widths[i].max(val.len());
                    }
                }

                for (i, title) in titles.into_iter().enumerate() {
                    write!(
                        f,
                        " {:1$} {2}",
                        title,
                        text_widths[i],
                        Self::SEPARATOR_VERTICAL
                    )?;
                }
                writeln!(f)?;

                let total_width = text_widths.iter().map(|x| x + 3).sum();
                for _ in 0..total_width {
                    write!(f, "{}", Self::SEPARATOR_HORIZONTAL)?;
                }

                for row in self.rows.iter() {
                    writeln!(f)?;

                    for (i, val) in row.iter().enumerate() {
                        write!(
                            f,
                            " {:1$} {2}",
                            val.to_string(),
                            text_widths[i],
                            Self::SEPARATOR_VERTICAL
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Methods of extracting an average/central value from a set of repeated
/// simulations.
///
/// In the process of creating an results table, the given averaging method is
/// only applied to the values of columns which change between runs.
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Average {
    #[default]
    /// Include all repeated values.
    None,
    /// Arithmetic mean of all values.
    Mean,
    /// Median of all values.
    Median,
    /// Maximum of all values.
    Max,
    /// Minimum of all values.
    Min,
}

/// Type of column that can appear in a data table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Column {
    // Variant order determines the order of columns in results tables:
    // https://doc.rust-lang.org/stable/std/cmp/trait.PartialOrd.html#derivable
    NodeCount,
    MaliciousRatio,
    SuccessRate,
    MaliciousRatioFunction(WrapFunc<Ratio, f64>),
    Constant(WrapFunc<(), f64>),
    Rounds,
    AttackRounds,
    AverageOf(Average),
    GrowthRate,
    MaliciousBlockShare,
    AttackSuccess,
    SelfishProfit,
}

/// Value which corresponds to a [`Column`].
#[derive(Debug, Clone, PartialEq)]
enum ColumnValue {
    Count(usize),
    Float(f64),
}

impl Column {
    /// Returns the value of a per-run statistic, or `None` for columns which
    /// are fixed by the simulation's configuration.
    fn statistic(&self, output: &SimulationOutput) -> Option<f64> {
        match &self {
            Self::GrowthRate => Some(output.growth_rate),
            Self::MaliciousBlockShare => Some(output.malicious_block_share()),
            Self::AttackSuccess => Some(output.attack_success_ratio),
            Self::SelfishProfit => Some(output.selfish_profit_ratio),
            _ => None,
        }
    }

    fn get_value(&self, output: &SimulationOutput) -> ColumnValue {
        use ColumnValue::*;

        if let Some(value) = self.statistic(output) {
            return Float(value);
        }

        match &self {
            Self::NodeCount => Count(output.config.node_count()),
            Self::MaliciousRatio => Float(output.config.malicious_ratio()),
            Self::SuccessRate => Float(output.config.success_rate()),
            Self::MaliciousRatioFunction(func) => {
                Float(func.call(output.config.malicious_ratio()))
            }
            Self::Constant(func) => Float(func.call(())),
            Self::Rounds => Count(output.rounds),
            Self::AttackRounds => Count(output.attack_rounds),
            Self::AverageOf(_) => unreachable!(
                "never need the single value of the average descriptor column"
            ),
            Self::GrowthRate
            | Self::MaliciousBlockShare
            | Self::AttackSuccess
            | Self::SelfishProfit => unreachable!(),
        }
    }

    fn get_average_value(
        &self,
        method: Average,
        data: &[SimulationOutput],
    ) -> ColumnValue {
        if let Self::AverageOf(_) = self {
            return ColumnValue::Count(data.len());
        }

        let values: Option<Vec<_>> =
            data.iter().map(|output| self.statistic(output)).collect();
        let Some(values) = values else {
            return self.get_value(&data[0]);
        };

        let avg = match method {
            Average::Mean => values.iter().sum::<f64>() / data.len() as f64,
            Average::Median => crate::utils::median_of_floats(values),
            Average::Max => values.into_iter().fold(f64::MIN, f64::max),
            Average::Min => values.into_iter().fold(f64::MAX, f64::min),
            Average::None => unreachable!(),
        };

        ColumnValue::Float(avg)
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::AverageOf(method) => match method {
                Average::Mean => write!(f, "Mean Of"),
                Average::Median => write!(f, "Median Of"),
                Average::Max => write!(f, "Max Of"),
                Average::Min => write!(f, "Min Of"),
                Average::None => unreachable!(),
            },
            Self::AttackRounds => write!(f, "Attack Rounds"),
            Self::AttackSuccess => write!(f, "Attack Success Ratio"),
            Self::Constant(func) => write!(f, "{}", func.name()),
            Self::GrowthRate => write!(f, "Growth Rate"),
            Self::MaliciousBlockShare => write!(f, "Malicious Block Share"),
            Self::MaliciousRatio => write!(f, "Malicious Ratio"),
            Self::MaliciousRatioFunction(func) => write!(f, "{}", func.name()),
            Self::NodeCount => write!(f, "Node Count"),
            Self::Rounds => write!(f, "Simulated Rounds"),
            Self::SelfishProfit => write!(f, "Selfish Profit Ratio"),
            Self::SuccessRate => write!(f, "Success Rate"),
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Count(count) => write!(f, "{}", count),
            Self::Float(value) => {
                write!(f, "{:.1$}", value, FLOAT_PRECISION_DIGITS)
            }
        }
    }
}
