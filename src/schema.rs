//! Report schema
//!
//! Every statistic in a table is addressed by a `(Split, Metric, Statistic)`
//! triple. Column labels are rendered from the triple and the caller's
//! metric display names, e.g. `test_accuracy mean`.

use serde::{Deserialize, Serialize};

/// Evaluation split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Development split (drives selection)
    Dev,
    /// Test split (drives reporting)
    Test,
}

/// Tracked metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Task performance (e.g. accuracy)
    Performance,
    /// Fairness score (e.g. 1 - rms TPR gap)
    Fairness,
}

/// Aggregate statistic over runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Arithmetic mean
    Mean,
    /// Sample standard deviation
    Std,
}

impl Split {
    /// Both splits, test first (report order).
    pub const REPORT_ORDER: [Self; 2] = [Self::Test, Self::Dev];

    /// Lowercase prefix used in column labels.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
        }
    }
}

impl Metric {
    /// Both metrics, performance first (report order).
    pub const REPORT_ORDER: [Self; 2] = [Self::Performance, Self::Fairness];
}

impl Statistic {
    /// Both statistics, mean first (report order).
    pub const REPORT_ORDER: [Self; 2] = [Self::Mean, Self::Std];

    /// Suffix used in column labels.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Std => "std",
        }
    }
}

/// Display names for the two tracked metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricNames {
    /// Label for the performance metric (e.g. "accuracy")
    pub performance: String,
    /// Label for the fairness metric (e.g. "rms_TPR")
    pub fairness: String,
}

impl Default for MetricNames {
    fn default() -> Self {
        Self {
            performance: "performance".to_string(),
            fairness: "fairness".to_string(),
        }
    }
}

impl MetricNames {
    /// Create metric names.
    #[must_use]
    pub fn new(performance: impl Into<String>, fairness: impl Into<String>) -> Self {
        Self {
            performance: performance.into(),
            fairness: fairness.into(),
        }
    }

    /// Display name of a metric.
    #[must_use]
    pub fn name(&self, metric: Metric) -> &str {
        match metric {
            Metric::Performance => &self.performance,
            Metric::Fairness => &self.fairness,
        }
    }
}

/// A `(split, metric, statistic)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatColumn {
    /// Evaluation split
    pub split: Split,
    /// Tracked metric
    pub metric: Metric,
    /// Aggregate statistic
    pub statistic: Statistic,
}

impl StatColumn {
    /// Create a triple.
    #[must_use]
    pub const fn new(split: Split, metric: Metric, statistic: Statistic) -> Self {
        Self {
            split,
            metric,
            statistic,
        }
    }

    /// Mean column for a split/metric pair.
    #[must_use]
    pub const fn mean(split: Split, metric: Metric) -> Self {
        Self::new(split, metric, Statistic::Mean)
    }

    /// The four columns of one split in report order.
    #[must_use]
    pub fn for_split(split: Split) -> Vec<Self> {
        Metric::REPORT_ORDER
            .iter()
            .flat_map(|&metric| {
                Statistic::REPORT_ORDER
                    .iter()
                    .map(move |&statistic| Self::new(split, metric, statistic))
            })
            .collect()
    }

    /// Label such as `dev_accuracy mean`.
    #[must_use]
    pub fn label(&self, names: &MetricNames) -> String {
        format!(
            "{}_{} {}",
            self.split.prefix(),
            names.name(self.metric),
            self.statistic.suffix()
        )
    }
}

/// One column of a `FinalTable` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    /// Method identifier
    Method,
    /// Aggregated statistic
    Stat(StatColumn),
    /// Dev-split distance to optimum used during selection
    DevDto,
    /// Cross-method distance to optimum over test means
    Dto,
    /// Epochs of the runs behind a row
    EpochList,
    /// Source artifacts of the runs behind a row
    ArtifactList,
}

impl Column {
    /// Column label for rendering.
    #[must_use]
    pub fn label(&self, names: &MetricNames) -> String {
        match self {
            Self::Method => "Models".to_string(),
            Self::Stat(stat) => stat.label(names),
            Self::DevDto => "dev_DTO mean".to_string(),
            Self::Dto => "DTO".to_string(),
            Self::EpochList => "epoch list".to_string(),
            Self::ArtifactList => "artifact list".to_string(),
        }
    }
}

/// Fixed report projection.
///
/// Method, test statistics, dev statistics (optional), DTO (optional),
/// then reproducibility lists (optional).
#[must_use]
pub fn report_columns(include_dev: bool, include_dto: bool, include_reproducibility: bool) -> Vec<Column> {
    let mut columns = vec![Column::Method];
    for split in Split::REPORT_ORDER {
        if split == Split::Dev && !include_dev {
            continue;
        }
        columns.extend(StatColumn::for_split(split).into_iter().map(Column::Stat));
    }
    if include_dto {
        columns.push(Column::Dto);
    }
    if include_reproducibility {
        columns.push(Column::EpochList);
        columns.push(Column::ArtifactList);
    }
    columns
}
