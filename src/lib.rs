//! # fairness-frontier: Pareto-Based Model Selection for Fairness Tables
//!
//! Post-processes repeated-trial experiment logs into a single
//! fairness/performance comparison table, one row per method.
//!
//! ## Pipeline
//!
//! - **Aggregate**: fold repeated runs into per-epoch mean/std ([`aggregate`])
//! - **Frontier**: keep Pareto-efficient epochs ([`pareto`])
//! - **Score**: distance to the utopia point ([`dto`])
//! - **Select**: one epoch per method by DTO, performance or fairness ([`selection`])
//! - **Assemble**: concatenate, re-score across methods, export configs ([`table`])
//!
//! ## Example Usage
//!
//! ```rust
//! use fairness_frontier::config::TableConfig;
//! use fairness_frontier::experiment::{MetricValues, RunLog, RunRecord};
//! use fairness_frontier::table::TableBuilder;
//!
//! let mut log = RunLog::new();
//! for run in 0..3 {
//!     log.add_run(RunRecord::new("Vanilla", 5, run, MetricValues::uniform(0.80, 0.62)));
//!     log.add_run(RunRecord::new("FairBatch", 5, run, MetricValues::uniform(0.78, 0.85)));
//! }
//!
//! let config = TableConfig::builder()
//!     .metric_names("accuracy", "rms_TPR")
//!     .build()?;
//! let table = TableBuilder::new(config).build(&log)?;
//!
//! assert_eq!(table.len(), 2);
//! println!("{table}");
//! # Ok::<(), fairness_frontier::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod dto;
pub mod error;
pub mod experiment;
pub mod export;
pub mod pareto;
pub mod schema;
pub mod selection;
pub mod storage;
pub mod table;

pub use error::{Error, Result};
