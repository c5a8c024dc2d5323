//! Experiment record schema tests

use fairness_frontier::aggregate::MetricAggregator;
use fairness_frontier::config::TableConfig;
use fairness_frontier::experiment::{AggregatedRecord, MetricValues, RunLog, RunRecord};
use fairness_frontier::schema::{Metric, Split, StatColumn, Statistic};
use fairness_frontier::table::TableBuilder;

// =============================================================================
// RunRecord Tests
// =============================================================================

#[test]
fn test_run_record_creation() {
    let run = RunRecord::new("Adv", 4, 1, MetricValues::new(0.8, 0.7, 0.79, 0.69));

    assert_eq!(run.method(), "Adv");
    assert_eq!(run.epoch(), 4);
    assert_eq!(run.group(), 4);
    assert_eq!(run.run_index(), 1);
    assert!((run.metrics().test_fairness - 0.69).abs() < f64::EPSILON);
    assert!(run.artifact().is_empty());
}

#[test]
fn test_run_record_serialization() {
    let run = RunRecord::builder("Adv", 4, 1, MetricValues::uniform(0.8, 0.7))
        .artifact("results/Adv/1/opt.yaml")
        .group(40)
        .build();

    let json = serde_json::to_string(&run).expect("serialization failed");
    let deserialized: RunRecord = serde_json::from_str(&json).expect("deserialization failed");

    assert_eq!(run, deserialized);
    assert_eq!(deserialized.group(), 40);
}

// =============================================================================
// RunLog Tests
// =============================================================================

#[test]
fn test_run_log_extend_keeps_order() {
    let mut log = RunLog::new();
    log.extend(vec![
        RunRecord::new("Z", 0, 0, MetricValues::uniform(0.5, 0.5)),
        RunRecord::new("A", 0, 0, MetricValues::uniform(0.5, 0.5)),
        RunRecord::new("Z", 1, 0, MetricValues::uniform(0.5, 0.5)),
    ]);

    assert_eq!(log.methods().collect::<Vec<_>>(), vec!["Z", "A"]);
    let z = log.runs_for_method("Z").unwrap();
    assert_eq!(z[0].epoch(), 0);
    assert_eq!(z[1].epoch(), 1);
}

#[test]
fn test_run_log_mismatched_key_fails_aggregation() {
    let mut log = RunLog::new();
    log.add_run_to("A", RunRecord::new("B", 0, 0, MetricValues::uniform(0.5, 0.5)));

    let table = TableBuilder::new(TableConfig::default()).build(&log).unwrap();
    assert!(table.is_empty());
    assert!(table.ensure_complete().is_err());
}

// =============================================================================
// AggregatedRecord Tests
// =============================================================================

fn aggregated() -> Vec<AggregatedRecord> {
    let runs = vec![
        RunRecord::builder("M", 2, 0, MetricValues::new(0.6, 0.4, 0.5, 0.3))
            .artifact("r0.yaml")
            .build(),
        RunRecord::builder("M", 2, 1, MetricValues::new(0.8, 0.6, 0.7, 0.5))
            .artifact("r1.yaml")
            .build(),
    ];
    MetricAggregator::new().aggregate("M", &runs).unwrap()
}

#[test]
fn test_aggregated_stat_lookup() {
    let records = aggregated();
    let record = &records[0];

    assert_eq!(record.method(), "M");
    assert_eq!(record.run_count(), 2);
    let dev_perf_mean = record.stat(StatColumn::mean(Split::Dev, Metric::Performance));
    assert!((dev_perf_mean - 0.7).abs() < 1e-12);
    let test_fair_std = record.stat(StatColumn::new(Split::Test, Metric::Fairness, Statistic::Std));
    assert!((test_fair_std - 0.02f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_aggregated_runs_are_aligned() {
    let records = aggregated();
    let runs: Vec<(u64, u64, &str)> = records[0].runs().collect();
    assert_eq!(runs, vec![(0, 2, "r0.yaml"), (1, 2, "r1.yaml")]);
}

#[test]
fn test_aggregated_record_serialization() {
    let records = aggregated();
    let json = serde_json::to_string(&records[0]).expect("serialization failed");
    let deserialized: AggregatedRecord =
        serde_json::from_str(&json).expect("deserialization failed");
    assert_eq!(records[0].group(), deserialized.group());
    assert_eq!(records[0].artifacts(), deserialized.artifacts());
    assert!((records[0].mean().dev_performance - deserialized.mean().dev_performance).abs() < 1e-12);
}
