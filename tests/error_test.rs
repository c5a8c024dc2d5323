//! Tests for error types

use fairness_frontier::error::AggregationError;
use fairness_frontier::Error;

#[test]
fn test_unknown_criterion_error() {
    let error = Error::UnknownCriterion("accuracy".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Unknown selection criterion 'accuracy'"));
    assert!(error_str.contains("DTO, performance, fairness"));
}

#[test]
fn test_config_error() {
    let error = Error::Config("num_trail must be greater than 0".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Configuration error"));
    assert!(error_str.contains("num_trail"));
}

#[test]
fn test_length_mismatch_error() {
    let error = Error::LengthMismatch {
        fairness: 3,
        performance: 2,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("3 fairness values"));
    assert!(error_str.contains("2 performance values"));
}

#[test]
fn test_aggregation_error_wraps_source() {
    let error = Error::Aggregation {
        method: "Adv".to_string(),
        source: AggregationError::MethodMismatch {
            expected: "Adv".to_string(),
            found: "FairBatch".to_string(),
            run_index: 3,
        },
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Aggregation failed for method 'Adv'"));
    assert!(error_str.contains("run 3 belongs to method 'FairBatch'"));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_non_finite_metric_error() {
    let error = AggregationError::NonFiniteMetric {
        metric: "test_fairness".to_string(),
        value: f64::NAN,
        run_index: 1,
        group: 12,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("non-finite test_fairness = NaN"));
    assert!(error_str.contains("group 12"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("Missing column 'epoch'".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("Missing column"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_error_debug_format() {
    let error = Error::UnknownCriterion("x".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("UnknownCriterion"));
}
