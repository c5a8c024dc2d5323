//! Fairness Table Example
//!
//! Builds a comparison table from a Parquet run log, or from a synthetic
//! log when no path is given.
//!
//! Run with:
//!   cargo run --example fairness_table
//!   cargo run --example fairness_table -- runs.parquet config.json table.parquet

use anyhow::{Context, Result};
use fairness_frontier::config::TableConfig;
use fairness_frontier::experiment::{MetricValues, RunLog, RunRecord};
use fairness_frontier::storage::{load_run_log_parquet, write_table_parquet};
use fairness_frontier::table::{MethodOutcome, TableBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "fairness table failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    let log = match args.next() {
        Some(path) => load_run_log_parquet(&path)
            .with_context(|| format!("loading run log from {path}"))?,
        None => synthetic_log(),
    };

    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            TableConfig::from_json(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => TableConfig::builder()
            .metric_names("accuracy", "rms_TPR")
            .include_reproducibility(true)
            .build()?,
    };

    let (table, export) = TableBuilder::new(config).build_and_export(&log)?;
    println!("{table}");

    for report in table.reports() {
        if !matches!(report.outcome, MethodOutcome::Selected { .. }) {
            println!("{}: {}", report.method, serde_json::to_string(&report.outcome)?);
        }
    }
    if let Some(export) = export {
        info!(copied = export.copied.len(), failed = export.failures.len(), "export finished");
    }

    if let Some(out) = args.next() {
        write_table_parquet(&table, &out).with_context(|| format!("writing table to {out}"))?;
        info!(path = %out, "wrote table");
    }
    Ok(())
}

/// Three methods, five runs, twenty epochs of noisy metric curves.
fn synthetic_log() -> RunLog {
    let mut rng = StdRng::seed_from_u64(7);
    let mut log = RunLog::new();
    let methods = [("Vanilla", 0.82, 0.60), ("Adv", 0.79, 0.78), ("FairBatch", 0.80, 0.74)];

    for (method, peak_perf, peak_fair) in methods {
        for run in 0..5 {
            for epoch in 0..20u64 {
                let progress = (epoch as f64 + 1.0) / 20.0;
                let perf = peak_perf * progress.sqrt() + rng.gen_range(-0.01..0.01);
                let fair = peak_fair * (1.0 - 0.3 * progress) + 0.3 * peak_fair * rng.gen::<f64>();
                let record = RunRecord::builder(method, epoch, run, MetricValues::uniform(perf, fair))
                    .artifact(format!("results/{method}/run{run}/opt.yaml"))
                    .build();
                log.add_run(record);
            }
        }
    }
    log
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
