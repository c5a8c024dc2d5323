//! Run Record - one evaluation of one run at one epoch

use serde::{Deserialize, Serialize};

use crate::schema::{Metric, Split};

/// The four scalar metrics recorded per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricValues {
    /// Dev-split performance
    pub dev_performance: f64,
    /// Dev-split fairness
    pub dev_fairness: f64,
    /// Test-split performance
    pub test_performance: f64,
    /// Test-split fairness
    pub test_fairness: f64,
}

impl MetricValues {
    /// Create metric values.
    #[must_use]
    pub const fn new(
        dev_performance: f64,
        dev_fairness: f64,
        test_performance: f64,
        test_fairness: f64,
    ) -> Self {
        Self {
            dev_performance,
            dev_fairness,
            test_performance,
            test_fairness,
        }
    }

    /// Same values on both splits.
    #[must_use]
    pub const fn uniform(performance: f64, fairness: f64) -> Self {
        Self::new(performance, fairness, performance, fairness)
    }

    /// Value for a split/metric pair.
    #[must_use]
    pub const fn get(&self, split: Split, metric: Metric) -> f64 {
        match (split, metric) {
            (Split::Dev, Metric::Performance) => self.dev_performance,
            (Split::Dev, Metric::Fairness) => self.dev_fairness,
            (Split::Test, Metric::Performance) => self.test_performance,
            (Split::Test, Metric::Fairness) => self.test_fairness,
        }
    }

    /// Mutable slot for a split/metric pair.
    pub fn get_mut(&mut self, split: Split, metric: Metric) -> &mut f64 {
        match (split, metric) {
            (Split::Dev, Metric::Performance) => &mut self.dev_performance,
            (Split::Dev, Metric::Fairness) => &mut self.dev_fairness,
            (Split::Test, Metric::Performance) => &mut self.test_performance,
            (Split::Test, Metric::Fairness) => &mut self.test_fairness,
        }
    }

    /// All four `(split, metric)` pairs.
    pub const PAIRS: [(Split, Metric); 4] = [
        (Split::Dev, Metric::Performance),
        (Split::Dev, Metric::Fairness),
        (Split::Test, Metric::Performance),
        (Split::Test, Metric::Fairness),
    ];
}

/// Run Record represents one evaluation of one training run.
///
/// Records are grouped by `group` (normally the epoch) when aggregating
/// repeated runs. The `artifact` is the run-local source config that gets
/// exported when the record's group is selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    method: String,
    group: u64,
    epoch: u64,
    run_index: u64,
    metrics: MetricValues,
    artifact: String,
}

impl RunRecord {
    /// Create a run record grouped by its epoch, with no artifact.
    ///
    /// # Arguments
    ///
    /// * `method` - Name of the method that produced the run
    /// * `epoch` - Epoch of the evaluation
    /// * `run_index` - Index of the repeated trial
    /// * `metrics` - Dev/test performance and fairness
    #[must_use]
    pub fn new(method: impl Into<String>, epoch: u64, run_index: u64, metrics: MetricValues) -> Self {
        Self {
            method: method.into(),
            group: epoch,
            epoch,
            run_index,
            metrics,
            artifact: String::new(),
        }
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        method: impl Into<String>,
        epoch: u64,
        run_index: u64,
        metrics: MetricValues,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(method, epoch, run_index, metrics)
    }

    /// Get the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the aggregation key.
    #[must_use]
    pub const fn group(&self) -> u64 {
        self.group
    }

    /// Get the epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the run index.
    #[must_use]
    pub const fn run_index(&self) -> u64 {
        self.run_index
    }

    /// Get the metric values.
    #[must_use]
    pub const fn metrics(&self) -> &MetricValues {
        &self.metrics
    }

    /// Get the source artifact reference (empty if none).
    #[must_use]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    record: RunRecord,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(method: impl Into<String>, epoch: u64, run_index: u64, metrics: MetricValues) -> Self {
        Self {
            record: RunRecord::new(method, epoch, run_index, metrics),
        }
    }

    /// Group under a key other than the epoch.
    #[must_use]
    pub const fn group(mut self, group: u64) -> Self {
        self.record.group = group;
        self
    }

    /// Set the source artifact reference (e.g. the run's `opt.yaml`).
    #[must_use]
    pub fn artifact(mut self, artifact: impl Into<String>) -> Self {
        self.record.artifact = artifact.into();
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_record_groups_by_epoch_by_default() {
        let run = RunRecord::new("FairBatch", 7, 2, MetricValues::uniform(0.8, 0.9));
        assert_eq!(run.group(), 7);
        assert_eq!(run.epoch(), 7);
        assert_eq!(run.run_index(), 2);
        assert!(run.artifact().is_empty());
    }

    #[test]
    fn test_run_record_builder_overrides() {
        let run = RunRecord::builder("Vanilla", 3, 0, MetricValues::uniform(0.7, 0.6))
            .group(11)
            .artifact("runs/0/opt.yaml")
            .build();
        assert_eq!(run.group(), 11);
        assert_eq!(run.epoch(), 3);
        assert_eq!(run.artifact(), "runs/0/opt.yaml");
    }

    #[test]
    fn test_metric_values_lookup() {
        let mut values = MetricValues::new(0.1, 0.2, 0.3, 0.4);
        assert!((values.get(Split::Test, Metric::Fairness) - 0.4).abs() < f64::EPSILON);
        *values.get_mut(Split::Dev, Metric::Performance) = 0.5;
        assert!((values.dev_performance - 0.5).abs() < f64::EPSILON);
    }
}
