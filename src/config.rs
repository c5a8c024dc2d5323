//! Table build configuration
//!
//! Everything is caller-supplied; there is no environment or CLI parsing
//! here. Defaults reproduce the classic report: Pareto filtering on the
//! test split, DTO selection, dev columns included.
//!
//! ```rust
//! use fairness_frontier::config::TableConfig;
//! use fairness_frontier::selection::SelectionCriterion;
//!
//! let config = TableConfig::from_json(r#"{ "criterion": "performance", "num_trail": 20 }"#)?;
//! assert_eq!(config.criterion, Some(SelectionCriterion::Performance));
//! assert!(config.pareto);
//! # Ok::<(), fairness_frontier::Error>(())
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregate::{MetricAggregator, SAMPLE_SEED};
use crate::dto::UtopiaPoint;
use crate::schema::{MetricNames, Split};
use crate::selection::{SelectionCriterion, SelectionPolicy, ThresholdMode, Thresholds};
use crate::{Error, Result};

/// Configuration of a table build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Methods to report, in order (`None` = discovery order)
    pub method_order: Option<Vec<String>>,
    /// Display names of the metrics
    pub metric_names: MetricNames,
    /// Keep only Pareto-efficient groups before selection
    pub pareto: bool,
    /// Split whose means define the Pareto frontier
    pub pareto_split: Split,
    /// Selection rule (`None` = keep all candidates)
    pub criterion: Option<SelectionCriterion>,
    /// Minimum dev means
    pub thresholds: Thresholds,
    /// Behavior when thresholds reject every candidate
    pub threshold_mode: ThresholdMode,
    /// Include dev statistics in the report projection
    pub include_dev: bool,
    /// Include epoch and artifact lists in the report projection
    pub include_reproducibility: bool,
    /// Copy selected artifacts here
    pub export_dir: Option<PathBuf>,
    /// Cap on groups considered per method
    pub num_trail: Option<usize>,
    /// Seed for the group sample
    pub sample_seed: u64,
    /// Ideal point for both DTO stages
    pub utopia: UtopiaPoint,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            method_order: None,
            metric_names: MetricNames::default(),
            pareto: true,
            pareto_split: Split::Test,
            criterion: Some(SelectionCriterion::Dto),
            thresholds: Thresholds::default(),
            threshold_mode: ThresholdMode::Lenient,
            include_dev: true,
            include_reproducibility: false,
            export_dir: None,
            num_trail: None,
            sample_seed: SAMPLE_SEED,
            utopia: UtopiaPoint::default(),
        }
    }
}

impl TableConfig {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCriterion` for an unrecognized `criterion`,
    /// `Error::Json` for malformed JSON and `Error::Config` for invalid
    /// values.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(name) = value.get("criterion").and_then(serde_json::Value::as_str) {
            name.parse::<SelectionCriterion>()?;
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.num_trail == Some(0) {
            return Err(Error::Config("num_trail must be greater than 0".to_string()));
        }
        if !self.thresholds.performance.is_finite() || !self.thresholds.fairness.is_finite() {
            return Err(Error::Config("thresholds must be finite".to_string()));
        }
        if !self.utopia.performance.is_finite() || !self.utopia.fairness.is_finite() {
            return Err(Error::Config("utopia point must be finite".to_string()));
        }
        if let Some(order) = &self.method_order {
            let mut seen = HashSet::new();
            if let Some(dup) = order.iter().find(|m| !seen.insert(m.as_str())) {
                return Err(Error::Config(format!(
                    "method '{dup}' appears twice in method_order"
                )));
            }
        }
        Ok(())
    }

    /// Aggregator honoring `num_trail` and `sample_seed`.
    #[must_use]
    pub fn aggregator(&self) -> MetricAggregator {
        match self.num_trail {
            Some(n) => MetricAggregator::new().with_sample(n, self.sample_seed),
            None => MetricAggregator::new(),
        }
    }

    /// Selection policy honoring criterion, thresholds and utopia point.
    #[must_use]
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy::new(self.criterion)
            .with_thresholds(self.thresholds, self.threshold_mode)
            .with_utopia(self.utopia)
    }
}

/// Builder for `TableConfig`.
#[derive(Debug, Default)]
pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    /// Report these methods in this order.
    #[must_use]
    pub fn method_order<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.method_order = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    /// Set metric display names.
    #[must_use]
    pub fn metric_names(mut self, performance: impl Into<String>, fairness: impl Into<String>) -> Self {
        self.config.metric_names = MetricNames::new(performance, fairness);
        self
    }

    /// Enable or disable Pareto filtering.
    #[must_use]
    pub const fn pareto(mut self, enabled: bool) -> Self {
        self.config.pareto = enabled;
        self
    }

    /// Split used for the Pareto frontier.
    #[must_use]
    pub const fn pareto_split(mut self, split: Split) -> Self {
        self.config.pareto_split = split;
        self
    }

    /// Set the selection criterion.
    #[must_use]
    pub const fn criterion(mut self, criterion: Option<SelectionCriterion>) -> Self {
        self.config.criterion = criterion;
        self
    }

    /// Set dev thresholds.
    #[must_use]
    pub const fn thresholds(mut self, performance: f64, fairness: f64) -> Self {
        self.config.thresholds = Thresholds::new(performance, fairness);
        self
    }

    /// Set the threshold fallback mode.
    #[must_use]
    pub const fn threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.config.threshold_mode = mode;
        self
    }

    /// Include dev statistics in the report.
    #[must_use]
    pub const fn include_dev(mut self, include: bool) -> Self {
        self.config.include_dev = include;
        self
    }

    /// Include epoch and artifact lists in the report.
    #[must_use]
    pub const fn include_reproducibility(mut self, include: bool) -> Self {
        self.config.include_reproducibility = include;
        self
    }

    /// Export selected artifacts to `dir`.
    #[must_use]
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = Some(dir.into());
        self
    }

    /// Consider at most `num_trail` groups per method.
    #[must_use]
    pub const fn num_trail(mut self, num_trail: usize) -> Self {
        self.config.num_trail = Some(num_trail);
        self
    }

    /// Seed for the group sample.
    #[must_use]
    pub const fn sample_seed(mut self, seed: u64) -> Self {
        self.config.sample_seed = seed;
        self
    }

    /// Ideal point for DTO.
    #[must_use]
    pub const fn utopia(mut self, utopia: UtopiaPoint) -> Self {
        self.config.utopia = utopia;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid values.
    pub fn build(self) -> Result<TableConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
