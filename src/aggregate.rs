//! Repeated-run aggregation
//!
//! Runs of one method are grouped by their group key (normally the epoch)
//! in an explicit ordered map, then each group is folded into mean and
//! sample standard deviation of the four metrics. Run bookkeeping (run
//! index, epoch, artifact) is carried along in encounter order so the
//! winning runs can be exported later.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::error::AggregationError;
use crate::experiment::{AggregatedRecord, MetricValues, RunRecord};
use crate::schema::MetricNames;

/// Default seed for group sampling.
pub const SAMPLE_SEED: u64 = 1;

/// Folds the runs of one method into one `AggregatedRecord` per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricAggregator {
    num_trail: Option<usize>,
    seed: u64,
}

impl Default for MetricAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricAggregator {
    /// Aggregator that keeps every group.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            num_trail: None,
            seed: SAMPLE_SEED,
        }
    }

    /// Keep at most `num_trail` groups, drawn uniformly without replacement.
    ///
    /// The draw is deterministic for a given `seed`.
    #[must_use]
    pub const fn with_sample(mut self, num_trail: usize, seed: u64) -> Self {
        self.num_trail = Some(num_trail);
        self.seed = seed;
        self
    }

    /// Aggregate the runs of `method`.
    ///
    /// Returns one record per distinct group key, in ascending key order.
    /// An empty `runs` slice yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `AggregationError` if a run belongs to another method or
    /// carries a non-finite metric value.
    pub fn aggregate(
        &self,
        method: &str,
        runs: &[RunRecord],
    ) -> std::result::Result<Vec<AggregatedRecord>, AggregationError> {
        let mut groups: BTreeMap<u64, Vec<&RunRecord>> = BTreeMap::new();
        for run in runs {
            validate(method, run)?;
            groups.entry(run.group()).or_default().push(run);
        }

        let records: Vec<AggregatedRecord> = groups
            .into_iter()
            .map(|(group, members)| fold_group(method, group, &members))
            .collect();

        Ok(self.sample(records))
    }

    fn sample(&self, records: Vec<AggregatedRecord>) -> Vec<AggregatedRecord> {
        let Some(num_trail) = self.num_trail else {
            return records;
        };
        if num_trail >= records.len() {
            return records;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut picked = index::sample(&mut rng, records.len(), num_trail).into_vec();
        picked.sort_unstable();

        let mut slots: Vec<Option<AggregatedRecord>> = records.into_iter().map(Some).collect();
        picked
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }
}

fn validate(method: &str, run: &RunRecord) -> std::result::Result<(), AggregationError> {
    if run.method() != method {
        return Err(AggregationError::MethodMismatch {
            expected: method.to_string(),
            found: run.method().to_string(),
            run_index: run.run_index(),
        });
    }

    let names = MetricNames::default();
    for (split, metric) in MetricValues::PAIRS {
        let value = run.metrics().get(split, metric);
        if !value.is_finite() {
            return Err(AggregationError::NonFiniteMetric {
                metric: format!("{}_{}", split.prefix(), names.name(metric)),
                value,
                run_index: run.run_index(),
                group: run.group(),
            });
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn fold_group(method: &str, group: u64, members: &[&RunRecord]) -> AggregatedRecord {
    let n = members.len() as f64;

    let mut mean = MetricValues::default();
    let mut std = MetricValues::default();
    for (split, metric) in MetricValues::PAIRS {
        let mu = members
            .iter()
            .map(|run| run.metrics().get(split, metric))
            .sum::<f64>()
            / n;
        // Sample std (n - 1); a single run has zero spread by convention.
        let sigma = if members.len() > 1 {
            let ss: f64 = members
                .iter()
                .map(|run| (run.metrics().get(split, metric) - mu).powi(2))
                .sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        *mean.get_mut(split, metric) = mu;
        *std.get_mut(split, metric) = sigma;
    }

    AggregatedRecord {
        method: method.to_string(),
        group,
        mean,
        std,
        run_indices: members.iter().map(|run| run.run_index()).collect(),
        epochs: members.iter().map(|run| run.epoch()).collect(),
        artifacts: members.iter().map(|run| run.artifact().to_string()).collect(),
    }
}
