//! Per-method model selection
//!
//! Candidates are first filtered by dev-split thresholds, then scored by
//! dev-split DTO, then reduced to a single row by the selection criterion:
//!
//! | Criterion     | Rule                      |
//! |---------------|---------------------------|
//! | `DTO`         | minimum dev DTO           |
//! | `performance` | maximum dev performance   |
//! | `fairness`    | maximum dev fairness      |
//! | none          | keep every candidate      |
//!
//! Ties always go to the first candidate in order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dto::UtopiaPoint;
use crate::experiment::AggregatedRecord;
use crate::schema::{Metric, Split};
use crate::Error;

/// Rule used to pick one row per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionCriterion {
    /// Minimize dev-split distance to the utopia point
    #[serde(rename = "DTO", alias = "dto")]
    Dto,
    /// Maximize dev-split performance mean
    #[serde(rename = "performance")]
    Performance,
    /// Maximize dev-split fairness mean
    #[serde(rename = "fairness")]
    Fairness,
}

impl SelectionCriterion {
    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dto => "DTO",
            Self::Performance => "performance",
            Self::Fairness => "fairness",
        }
    }
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DTO" | "dto" => Ok(Self::Dto),
            "performance" => Ok(Self::Performance),
            "fairness" => Ok(Self::Fairness),
            other => Err(Error::UnknownCriterion(other.to_string())),
        }
    }
}

/// What to do when dev thresholds reject every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Fall back to the unfiltered candidates
    #[default]
    Lenient,
    /// Produce no row for the method
    Strict,
}

/// Minimum dev-split means a candidate must reach.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum dev performance mean
    pub performance: f64,
    /// Minimum dev fairness mean
    pub fairness: f64,
}

impl Thresholds {
    /// Create thresholds.
    #[must_use]
    pub const fn new(performance: f64, fairness: f64) -> Self {
        Self {
            performance,
            fairness,
        }
    }

    /// True if `record` meets both thresholds.
    #[must_use]
    pub fn admits(&self, record: &AggregatedRecord) -> bool {
        record.mean_of(Split::Dev, Metric::Performance) >= self.performance
            && record.mean_of(Split::Dev, Metric::Fairness) >= self.fairness
    }
}

/// An aggregated record with its dev-split DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The candidate
    pub record: AggregatedRecord,
    /// Dev-split distance to optimum
    pub dev_dto: f64,
}

/// Result of selecting within one method.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Chosen rows: one with a criterion, all candidates without
    Rows(Vec<ScoredRecord>),
    /// Strict thresholds rejected every candidate
    ThresholdExcluded,
}

/// Chooses the representative row(s) of one method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    criterion: Option<SelectionCriterion>,
    thresholds: Thresholds,
    mode: ThresholdMode,
    utopia: UtopiaPoint,
}

impl SelectionPolicy {
    /// Policy with no thresholds and the default utopia point.
    #[must_use]
    pub fn new(criterion: Option<SelectionCriterion>) -> Self {
        Self {
            criterion,
            thresholds: Thresholds::default(),
            mode: ThresholdMode::default(),
            utopia: UtopiaPoint::default(),
        }
    }

    /// Set dev thresholds and the fallback mode.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: Thresholds, mode: ThresholdMode) -> Self {
        self.thresholds = thresholds;
        self.mode = mode;
        self
    }

    /// Set the utopia point used for dev DTO.
    #[must_use]
    pub const fn with_utopia(mut self, utopia: UtopiaPoint) -> Self {
        self.utopia = utopia;
        self
    }

    /// Get the selection criterion.
    #[must_use]
    pub const fn criterion(&self) -> Option<SelectionCriterion> {
        self.criterion
    }

    /// Apply dev thresholds.
    ///
    /// Returns `None` only in strict mode when nothing survives. In lenient
    /// mode an emptied set falls back to the input.
    #[must_use]
    pub fn apply_thresholds(&self, records: Vec<AggregatedRecord>) -> Option<Vec<AggregatedRecord>> {
        if records.is_empty() {
            return Some(records);
        }
        let kept: Vec<AggregatedRecord> = records
            .iter()
            .filter(|record| self.thresholds.admits(record))
            .cloned()
            .collect();
        if !kept.is_empty() {
            return Some(kept);
        }
        match self.mode {
            ThresholdMode::Lenient => {
                debug!(
                    candidates = records.len(),
                    "thresholds rejected every candidate, keeping unfiltered set"
                );
                Some(records)
            }
            ThresholdMode::Strict => None,
        }
    }

    /// Score candidates by dev DTO, in order.
    #[must_use]
    pub fn score(&self, records: Vec<AggregatedRecord>) -> Vec<ScoredRecord> {
        records
            .into_iter()
            .map(|record| {
                let dev_dto = self.utopia.distance(
                    record.mean_of(Split::Dev, Metric::Fairness),
                    record.mean_of(Split::Dev, Metric::Performance),
                );
                ScoredRecord { record, dev_dto }
            })
            .collect()
    }

    /// Filter, score and select.
    #[must_use]
    pub fn select(&self, records: Vec<AggregatedRecord>) -> Selection {
        let Some(candidates) = self.apply_thresholds(records) else {
            return Selection::ThresholdExcluded;
        };
        let mut scored = self.score(candidates);

        let Some(criterion) = self.criterion else {
            return Selection::Rows(scored);
        };

        let chosen = match criterion {
            SelectionCriterion::Dto => stable_argmin(scored.iter().map(|c| c.dev_dto)),
            SelectionCriterion::Performance => stable_argmax(
                scored
                    .iter()
                    .map(|c| c.record.mean_of(Split::Dev, Metric::Performance)),
            ),
            SelectionCriterion::Fairness => stable_argmax(
                scored
                    .iter()
                    .map(|c| c.record.mean_of(Split::Dev, Metric::Fairness)),
            ),
        };

        match chosen {
            Some(i) => {
                let pick = scored.swap_remove(i);
                debug!(
                    method = pick.record.method(),
                    group = pick.record.group(),
                    criterion = %criterion,
                    dev_dto = pick.dev_dto,
                    "selected candidate"
                );
                Selection::Rows(vec![pick])
            }
            None => Selection::Rows(Vec::new()),
        }
    }
}

/// Index of the first minimum.
pub fn stable_argmin(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    values
        .into_iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first maximum.
pub fn stable_argmax(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    stable_argmin(values.into_iter().map(|v| -v))
}
