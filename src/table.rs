//! Cross-method comparison table
//!
//! For every method, in configured or discovery order:
//!
//! ```text
//! RunRecords ─▶ aggregate ─▶ [sample] ─▶ [pareto] ─▶ thresholds ─▶ dev DTO ─▶ select
//! ```
//!
//! The selected rows are concatenated into a `FinalTable`. With a selection
//! criterion, the table is then re-scored with a cross-method DTO over the
//! test-split means.
//!
//! ## Example
//!
//! ```rust
//! use fairness_frontier::config::TableConfig;
//! use fairness_frontier::experiment::{MetricValues, RunLog, RunRecord};
//! use fairness_frontier::table::TableBuilder;
//!
//! let mut log = RunLog::new();
//! for (epoch, (perf, fair)) in [(0.80, 0.70), (0.95, 0.90), (0.85, 0.75)].into_iter().enumerate() {
//!     log.add_run(RunRecord::new("Adv", epoch as u64, 0, MetricValues::uniform(perf, fair)));
//! }
//!
//! let table = TableBuilder::new(TableConfig::default()).build(&log)?;
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.rows()[0].record.group(), 1);
//! # Ok::<(), fairness_frontier::Error>(())
//! ```

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::dto::dto;
use crate::error::AggregationError;
use crate::experiment::{AggregatedRecord, RunLog, RunRecord};
use crate::export::{ArtifactSink, ExportReport, FsArtifactSink};
use crate::pareto::pareto_frontier;
use crate::schema::{report_columns, Column, Metric, MetricNames, Split};
use crate::selection::{Selection, SelectionCriterion};
use crate::{Error, Result};

/// One row of the final table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Method identifier
    pub method: String,
    /// Aggregated statistics and run bookkeeping
    pub record: AggregatedRecord,
    /// Dev-split DTO computed during selection
    pub dev_dto: f64,
    /// Cross-method DTO over test means (set when a criterion was used)
    pub dto: Option<f64>,
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Absent value
    Null,
    /// List of epochs
    Epochs(Vec<u64>),
    /// List of artifact references
    Artifacts(Vec<String>),
}

impl TableRow {
    /// Value of `column` in this row.
    #[must_use]
    pub fn value(&self, column: Column) -> Cell {
        match column {
            Column::Method => Cell::Text(self.method.clone()),
            Column::Stat(stat) => Cell::Number(self.record.stat(stat)),
            Column::DevDto => Cell::Number(self.dev_dto),
            Column::Dto => self.dto.map_or(Cell::Null, Cell::Number),
            Column::EpochList => Cell::Epochs(self.record.epochs().to_vec()),
            Column::ArtifactList => Cell::Artifacts(self.record.artifacts().to_vec()),
        }
    }
}

/// What happened to one method during the build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodOutcome {
    /// Rows were added to the table
    Selected {
        /// Number of rows contributed
        rows: usize,
    },
    /// The method had no runs
    Empty,
    /// The method's runs could not be aggregated
    Failed {
        /// Aggregation failure
        #[serde(serialize_with = "serialize_display")]
        error: AggregationError,
    },
    /// Strict thresholds rejected every candidate
    ThresholdExcluded,
}

fn serialize_display<S: serde::Serializer>(
    error: &AggregationError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Per-method outcome entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodReport {
    /// Method identifier
    pub method: String,
    /// Outcome
    pub outcome: MethodOutcome,
}

/// The cross-method comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalTable {
    rows: Vec<TableRow>,
    reports: Vec<MethodReport>,
    criterion: Option<SelectionCriterion>,
    metric_names: MetricNames,
    include_dev: bool,
    include_reproducibility: bool,
    generated_at: DateTime<Utc>,
}

impl FinalTable {
    /// Rows in method order.
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-method outcomes in method order.
    #[must_use]
    pub fn reports(&self) -> &[MethodReport] {
        &self.reports
    }

    /// Outcome of one method.
    #[must_use]
    pub fn outcome(&self, method: &str) -> Option<&MethodOutcome> {
        self.reports
            .iter()
            .find(|r| r.method == method)
            .map(|r| &r.outcome)
    }

    /// Rows contributed by one method.
    pub fn rows_for<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a TableRow> + 'a {
        self.rows.iter().filter(move |row| row.method == method)
    }

    /// Criterion used for selection.
    #[must_use]
    pub const fn criterion(&self) -> Option<SelectionCriterion> {
        self.criterion
    }

    /// Metric display names.
    #[must_use]
    pub const fn metric_names(&self) -> &MetricNames {
        &self.metric_names
    }

    /// Build timestamp.
    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Report projection.
    ///
    /// Without a criterion the cross-method DTO does not exist, so the
    /// dev DTO is reported in its place.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = report_columns(
            self.include_dev,
            self.criterion.is_some(),
            self.include_reproducibility,
        );
        if self.criterion.is_none() {
            let at = columns
                .iter()
                .position(|c| matches!(c, Column::EpochList))
                .unwrap_or(columns.len());
            columns.insert(at, Column::DevDto);
        }
        columns
    }

    /// Labels of the report projection.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns()
            .iter()
            .map(|c| c.label(&self.metric_names))
            .collect()
    }

    /// Cell at `row` / `column`, if the row exists.
    #[must_use]
    pub fn value(&self, row: usize, column: Column) -> Option<Cell> {
        self.rows.get(row).map(|r| r.value(column))
    }

    /// Fail with the first aggregation error, if any method failed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Aggregation` for the first failed method.
    pub fn ensure_complete(&self) -> Result<()> {
        for report in &self.reports {
            if let MethodOutcome::Failed { error } = &report.outcome {
                return Err(Error::Aggregation {
                    method: report.method.clone(),
                    source: error.clone(),
                });
            }
        }
        Ok(())
    }

    /// Copy the artifacts behind every selected row to `dest_root`.
    ///
    /// Nothing is exported for a table built without a criterion.
    pub fn export_artifacts<S: ArtifactSink + ?Sized>(&self, sink: &S, dest_root: &Path) -> ExportReport {
        let mut report = ExportReport::default();
        if self.criterion.is_none() {
            debug!("no selection criterion, skipping artifact export");
            return report;
        }
        for row in &self.rows {
            report.export_row(sink, dest_root, &row.method, row.record.runs());
        }
        info!(
            copied = report.copied.len(),
            failed = report.failures.len(),
            dest = %dest_root.display(),
            "exported selected artifacts"
        );
        report
    }
}

impl fmt::Display for FinalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.columns();
        let header = self.column_names();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| columns.iter().map(|&c| render_cell(&row.value(c))).collect())
            .collect();

        let widths: Vec<usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| body.iter().map(|r| r[i].len()).fold(h.len(), usize::max))
            .collect();

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        writeln!(f, "{}", line(&header))?;
        writeln!(
            f,
            "{}",
            widths.iter().map(|&w| "-".repeat(w)).collect::<Vec<_>>().join("-+-")
        )?;
        for row in &body {
            writeln!(f, "{}", line(row))?;
        }
        Ok(())
    }
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => text.clone(),
        Cell::Number(value) => format!("{value:.4}"),
        Cell::Null => String::new(),
        Cell::Epochs(epochs) => format!("{epochs:?}"),
        Cell::Artifacts(artifacts) => format!("{artifacts:?}"),
    }
}

/// Per-method result before concatenation.
struct MethodResult {
    report: MethodReport,
    rows: Vec<TableRow>,
}

/// Builds a `FinalTable` from a `RunLog`.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    config: TableConfig,
}

impl TableBuilder {
    /// Create a builder from a configuration.
    #[must_use]
    pub const fn new(config: TableConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Build the table. Pure computation; nothing is exported.
    ///
    /// Methods whose runs fail to aggregate are skipped and reported as
    /// `MethodOutcome::Failed`; methods in `method_order` that are absent
    /// from the log are reported as `MethodOutcome::Empty`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build(&self, log: &RunLog) -> Result<FinalTable> {
        self.config.validate()?;

        let order: Vec<String> = match &self.config.method_order {
            Some(order) => order.clone(),
            None => log.methods().map(str::to_string).collect(),
        };

        #[cfg(feature = "rayon")]
        let results: Vec<MethodResult> = order
            .par_iter()
            .map(|method| self.process_method(method, log.runs_for_method(method)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let results: Vec<MethodResult> = order
            .iter()
            .map(|method| self.process_method(method, log.runs_for_method(method)))
            .collect();

        let mut rows = Vec::new();
        let mut reports = Vec::with_capacity(results.len());
        for result in results {
            rows.extend(result.rows);
            reports.push(result.report);
        }

        if self.config.criterion.is_some() {
            let fairness: Vec<f64> = rows
                .iter()
                .map(|r| r.record.mean_of(Split::Test, Metric::Fairness))
                .collect();
            let performance: Vec<f64> = rows
                .iter()
                .map(|r| r.record.mean_of(Split::Test, Metric::Performance))
                .collect();
            let scores = dto(&fairness, &performance, self.config.utopia)?;
            for (row, score) in rows.iter_mut().zip(scores) {
                row.dto = Some(score);
            }
        }

        info!(
            methods = reports.len(),
            rows = rows.len(),
            criterion = ?self.config.criterion,
            "built comparison table"
        );

        Ok(FinalTable {
            rows,
            reports,
            criterion: self.config.criterion,
            metric_names: self.config.metric_names.clone(),
            include_dev: self.config.include_dev,
            include_reproducibility: self.config.include_reproducibility,
            generated_at: Utc::now(),
        })
    }

    /// Build the table, then export selected artifacts if `export_dir` is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid. Export
    /// failures are reported in the `ExportReport`, not as errors.
    pub fn build_and_export(&self, log: &RunLog) -> Result<(FinalTable, Option<ExportReport>)> {
        self.build_and_export_with(log, &FsArtifactSink)
    }

    /// Like `build_and_export`, with a custom sink.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build_and_export_with<S: ArtifactSink + ?Sized>(
        &self,
        log: &RunLog,
        sink: &S,
    ) -> Result<(FinalTable, Option<ExportReport>)> {
        let table = self.build(log)?;
        let report = self
            .config
            .export_dir
            .as_deref()
            .map(|dir| table.export_artifacts(sink, dir));
        Ok((table, report))
    }

    fn process_method(&self, method: &str, runs: Option<&[RunRecord]>) -> MethodResult {
        let outcome_only = |outcome| MethodResult {
            report: MethodReport {
                method: method.to_string(),
                outcome,
            },
            rows: Vec::new(),
        };

        let runs = runs.unwrap_or_default();
        if runs.is_empty() {
            debug!(method, "no runs, skipping");
            return outcome_only(MethodOutcome::Empty);
        }

        let mut records = match self.config.aggregator().aggregate(method, runs) {
            Ok(records) => records,
            Err(error) => {
                warn!(method, %error, "aggregation failed, skipping method");
                return outcome_only(MethodOutcome::Failed { error });
            }
        };
        debug!(method, runs = runs.len(), groups = records.len(), "aggregated runs");

        if self.config.pareto {
            records = pareto_frontier(records, self.config.pareto_split);
            debug!(method, frontier = records.len(), "pareto frontier");
        }

        match self.config.selection_policy().select(records) {
            Selection::Rows(scored) => {
                let rows: Vec<TableRow> = scored
                    .into_iter()
                    .map(|s| TableRow {
                        method: method.to_string(),
                        record: s.record,
                        dev_dto: s.dev_dto,
                        dto: None,
                    })
                    .collect();
                MethodResult {
                    report: MethodReport {
                        method: method.to_string(),
                        outcome: MethodOutcome::Selected { rows: rows.len() },
                    },
                    rows,
                }
            }
            Selection::ThresholdExcluded => {
                warn!(method, "strict thresholds rejected every candidate");
                outcome_only(MethodOutcome::ThresholdExcluded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::MetricValues;
    use crate::schema::StatColumn;

    fn log_with(method: &str, points: &[(f64, f64)]) -> RunLog {
        let mut log = RunLog::new();
        for (epoch, &(perf, fair)) in points.iter().enumerate() {
            log.add_run(RunRecord::new(method, epoch as u64, 0, MetricValues::uniform(perf, fair)));
        }
        log
    }

    #[test]
    fn test_missing_method_is_empty() {
        let log = log_with("A", &[(0.8, 0.8)]);
        let config = TableConfig::builder().method_order(["A", "Ghost"]).build().unwrap();
        let table = TableBuilder::new(config).build(&log).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.outcome("Ghost"), Some(&MethodOutcome::Empty));
        assert_eq!(table.outcome("A"), Some(&MethodOutcome::Selected { rows: 1 }));
    }

    #[test]
    fn test_columns_without_criterion_report_dev_dto() {
        let log = log_with("A", &[(0.8, 0.8), (0.9, 0.7)]);
        let config = TableConfig::builder()
            .criterion(None)
            .include_dev(false)
            .build()
            .unwrap();
        let table = TableBuilder::new(config).build(&log).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().last(), Some(&Column::DevDto));
        assert!(table.rows().iter().all(|r| r.dto.is_none()));
    }

    #[test]
    fn test_value_lookup() {
        let log = log_with("A", &[(0.8, 0.6)]);
        let table = TableBuilder::new(TableConfig::default()).build(&log).unwrap();
        let cell = table
            .value(0, Column::Stat(StatColumn::mean(Split::Test, Metric::Fairness)))
            .unwrap();
        assert_eq!(cell, Cell::Number(0.6));
        assert_eq!(table.value(0, Column::Method), Some(Cell::Text("A".to_string())));
        assert!(table.value(1, Column::Method).is_none());
    }

    #[test]
    fn test_display_renders_header_and_rows() {
        let log = log_with("A", &[(0.8, 0.6)]);
        let table = TableBuilder::new(TableConfig::default()).build(&log).unwrap();
        let text = table.to_string();
        assert!(text.starts_with("Models"));
        assert!(text.contains("test_performance mean"));
        assert!(text.contains("0.8000"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_ensure_complete_reports_failure() {
        let mut log = log_with("A", &[(0.8, 0.6)]);
        log.add_run(RunRecord::new("B", 0, 0, MetricValues::uniform(f64::INFINITY, 0.5)));
        let table = TableBuilder::new(TableConfig::default()).build(&log).unwrap();
        assert_eq!(table.len(), 1);
        let err = table.ensure_complete().unwrap_err();
        assert!(matches!(err, Error::Aggregation { ref method, .. } if method == "B"));
    }
}
