//! Distance to optimum (DTO)
//!
//! Euclidean distance between a (fairness, performance) point and a
//! utopia point. Lower is better. Inputs must already be normalized so
//! that the utopia coordinates represent the optimum; no normalization
//! happens here.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The ideal (fairness, performance) point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtopiaPoint {
    /// Ideal fairness
    pub fairness: f64,
    /// Ideal performance
    pub performance: f64,
}

impl Default for UtopiaPoint {
    fn default() -> Self {
        Self {
            fairness: 1.0,
            performance: 1.0,
        }
    }
}

impl UtopiaPoint {
    /// Create a utopia point.
    #[must_use]
    pub const fn new(fairness: f64, performance: f64) -> Self {
        Self {
            fairness,
            performance,
        }
    }

    /// DTO of a single point.
    #[must_use]
    pub fn distance(&self, fairness: f64, performance: f64) -> f64 {
        (self.fairness - fairness).hypot(self.performance - performance)
    }
}

/// DTO for every index of paired fairness/performance slices.
///
/// # Errors
///
/// Returns `Error::LengthMismatch` if the slices differ in length.
///
/// # Examples
///
/// ```rust
/// use fairness_frontier::dto::{dto, UtopiaPoint};
///
/// let scores = dto(&[0.9], &[0.95], UtopiaPoint::default())?;
/// assert!((scores[0] - 0.1118).abs() < 1e-4);
/// # Ok::<(), fairness_frontier::Error>(())
/// ```
pub fn dto(fairness: &[f64], performance: &[f64], utopia: UtopiaPoint) -> Result<Vec<f64>> {
    if fairness.len() != performance.len() {
        return Err(Error::LengthMismatch {
            fairness: fairness.len(),
            performance: performance.len(),
        });
    }
    Ok(fairness
        .iter()
        .zip(performance)
        .map(|(&f, &p)| utopia.distance(f, p))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dto_at_utopia_is_zero() {
        let scores = dto(&[1.0], &[1.0], UtopiaPoint::default()).unwrap();
        assert!(scores[0].abs() < f64::EPSILON);
    }

    #[test]
    fn test_dto_custom_utopia() {
        let utopia = UtopiaPoint::new(0.0, 0.0);
        let scores = dto(&[3.0], &[4.0], utopia).unwrap();
        assert!((scores[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_dto_length_mismatch() {
        let err = dto(&[0.1, 0.2], &[0.3], UtopiaPoint::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                fairness: 2,
                performance: 1
            }
        ));
    }
}
