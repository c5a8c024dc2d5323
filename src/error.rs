//! Error types for fairness-frontier
//!
//! Data errors are local to one method and never abort a table build.
//! Configuration errors are caller mistakes and always do.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a method's runs cannot be folded into aggregated statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    /// A run belongs to a different method than the one being aggregated
    #[error("run {run_index} belongs to method '{found}', expected '{expected}'")]
    MethodMismatch {
        /// Method under aggregation
        expected: String,
        /// Method named by the offending run
        found: String,
        /// Run index of the offending record
        run_index: u64,
    },

    /// A metric value is NaN or infinite
    #[error("non-finite {metric} = {value} in run {run_index} (group {group})")]
    NonFiniteMetric {
        /// Column label of the offending metric
        metric: String,
        /// The offending value
        value: f64,
        /// Run index of the offending record
        run_index: u64,
        /// Group key of the offending record
        group: u64,
    },
}

/// fairness-frontier error types
#[derive(Error, Debug)]
pub enum Error {
    /// Aggregation failed for one method (data error)
    #[error("Aggregation failed for method '{method}': {source}")]
    Aggregation {
        /// Method whose runs could not be aggregated
        method: String,
        /// Underlying cause
        #[source]
        source: AggregationError,
    },

    /// Selection criterion is not one of DTO, performance, fairness
    #[error("Unknown selection criterion '{0}'\nExpected one of: DTO, performance, fairness")]
    UnknownCriterion(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Paired metric slices differ in length
    #[error("Length mismatch: {fairness} fairness values vs {performance} performance values")]
    LengthMismatch {
        /// Number of fairness values
        fairness: usize,
        /// Number of performance values
        performance: usize,
    },

    /// Storage error (Parquet/Arrow layout)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
