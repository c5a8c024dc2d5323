//! Pareto frontier over (fairness, performance) pairs
//!
//! Both axes are "bigger is better". A point is dominated when another
//! point is at least as good on both axes and strictly better on one.
//! Identical points never dominate each other, so ties are all retained.
//!
//! Epoch counts per method are small, so the pairwise O(N²) check is used.

use crate::experiment::AggregatedRecord;
use crate::schema::{Metric, Split};

/// A (fairness, performance) pair with a back-reference to its source row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierPoint {
    /// Fairness value (bigger is better)
    pub fairness: f64,
    /// Performance value (bigger is better)
    pub performance: f64,
    /// Index of the source row
    pub index: usize,
}

impl FrontierPoint {
    /// View the `split` means of `record` as a point.
    #[must_use]
    pub fn from_record(record: &AggregatedRecord, split: Split, index: usize) -> Self {
        Self {
            fairness: record.mean_of(split, Metric::Fairness),
            performance: record.mean_of(split, Metric::Performance),
            index,
        }
    }

    /// True if `self` weakly dominates `other` with one strict inequality.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        self.fairness >= other.fairness
            && self.performance >= other.performance
            && (self.fairness > other.fairness || self.performance > other.performance)
    }
}

/// Pareto-efficiency mask.
///
/// `mask[i]` is true iff `points[i]` is not dominated by any other point.
#[must_use]
pub fn pareto_mask(points: &[FrontierPoint]) -> Vec<bool> {
    points
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            !points
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.dominates(candidate))
        })
        .collect()
}

/// Pareto-efficiency mask over parallel fairness/performance slices.
///
/// Extra elements of the longer slice are ignored.
#[must_use]
pub fn is_pareto_efficient(fairness: &[f64], performance: &[f64]) -> Vec<bool> {
    let points: Vec<FrontierPoint> = fairness
        .iter()
        .zip(performance)
        .enumerate()
        .map(|(index, (&fairness, &performance))| FrontierPoint {
            fairness,
            performance,
            index,
        })
        .collect();
    pareto_mask(&points)
}

/// Keep the records on the `split` Pareto frontier, in original order.
#[must_use]
pub fn pareto_frontier(records: Vec<AggregatedRecord>, split: Split) -> Vec<AggregatedRecord> {
    let points: Vec<FrontierPoint> = records
        .iter()
        .enumerate()
        .map(|(i, record)| FrontierPoint::from_record(record, split, i))
        .collect();
    let mask = pareto_mask(&points);

    records
        .into_iter()
        .zip(mask)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominated_point_removed() {
        let mask = is_pareto_efficient(&[0.9, 0.5, 0.95], &[0.9, 0.5, 0.8]);
        assert_eq!(mask, vec![true, false, true]);
    }

    #[test]
    fn test_identical_points_both_retained() {
        let mask = is_pareto_efficient(&[0.7, 0.7], &[0.8, 0.8]);
        assert_eq!(mask, vec![true, true]);
    }

    #[test]
    fn test_equal_on_one_axis_strict_on_other() {
        // (0.7, 0.9) dominates (0.7, 0.8)
        let mask = is_pareto_efficient(&[0.7, 0.7], &[0.8, 0.9]);
        assert_eq!(mask, vec![false, true]);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(is_pareto_efficient(&[0.1], &[0.1]), vec![true]);
        assert!(is_pareto_efficient(&[], &[]).is_empty());
    }

    #[test]
    fn test_dominates_is_irreflexive() {
        let p = FrontierPoint {
            fairness: 0.5,
            performance: 0.5,
            index: 0,
        };
        assert!(!p.dominates(&p));
    }
}
