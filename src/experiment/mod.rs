//! Experiment records
//!
//! ## Schema Overview
//!
//! ```text
//! RunLog ──< method ──< RunRecord (N runs × M epochs)
//!                            │ aggregate (group by epoch)
//!                            ▼
//!                     AggregatedRecord (M)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use fairness_frontier::experiment::{MetricValues, RunLog, RunRecord};
//!
//! let mut log = RunLog::new();
//! for run in 0..3 {
//!     let record = RunRecord::builder("Adv", 10, run, MetricValues::uniform(0.81, 0.90))
//!         .artifact(format!("results/Adv/run{run}/opt.yaml"))
//!         .build();
//!     log.add_run(record);
//! }
//!
//! assert_eq!(log.run_count(), 3);
//! ```

mod aggregated_record;
mod run_log;
mod run_record;

pub use aggregated_record::AggregatedRecord;
pub use run_log::RunLog;
pub use run_record::{MetricValues, RunRecord, RunRecordBuilder};
