//! Aggregated Record - repeated runs folded into mean/std statistics

use serde::{Deserialize, Serialize};

use super::MetricValues;
use crate::schema::{Metric, Split, StatColumn, Statistic};

/// Aggregated Record represents one group (normally one epoch) of a
/// method after folding all of its runs.
///
/// `run_indices`, `epochs` and `artifacts` are index-aligned: position `i`
/// of each list describes the same contributing run, in encounter order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedRecord {
    pub(crate) method: String,
    pub(crate) group: u64,
    pub(crate) mean: MetricValues,
    pub(crate) std: MetricValues,
    pub(crate) run_indices: Vec<u64>,
    pub(crate) epochs: Vec<u64>,
    pub(crate) artifacts: Vec<String>,
}

impl AggregatedRecord {
    /// Get the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the group key.
    #[must_use]
    pub const fn group(&self) -> u64 {
        self.group
    }

    /// Means over runs.
    #[must_use]
    pub const fn mean(&self) -> &MetricValues {
        &self.mean
    }

    /// Sample standard deviations over runs (zero for a single run).
    #[must_use]
    pub const fn std(&self) -> &MetricValues {
        &self.std
    }

    /// Value of a `(split, metric, statistic)` triple.
    #[must_use]
    pub const fn stat(&self, column: StatColumn) -> f64 {
        match column.statistic {
            Statistic::Mean => self.mean.get(column.split, column.metric),
            Statistic::Std => self.std.get(column.split, column.metric),
        }
    }

    /// Mean of a split/metric pair.
    #[must_use]
    pub const fn mean_of(&self, split: Split, metric: Metric) -> f64 {
        self.mean.get(split, metric)
    }

    /// Contributing run indices.
    #[must_use]
    pub fn run_indices(&self) -> &[u64] {
        &self.run_indices
    }

    /// Contributing run epochs.
    #[must_use]
    pub fn epochs(&self) -> &[u64] {
        &self.epochs
    }

    /// Contributing source artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }

    /// Number of contributing runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.run_indices.len()
    }

    /// Iterate `(run_index, epoch, artifact)` triples.
    pub fn runs(&self) -> impl Iterator<Item = (u64, u64, &str)> + '_ {
        self.run_indices
            .iter()
            .zip(&self.epochs)
            .zip(&self.artifacts)
            .map(|((&run, &epoch), artifact)| (run, epoch, artifact.as_str()))
    }
}
