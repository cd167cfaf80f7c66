//! Descriptive statistics over a set of balance readings.
//!
//! Standard deviation uses the sample convention (divisor `n - 1`), the same
//! one a spreadsheet `STDEV` or a dataframe `std()` reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatsError {
    #[error("cannot compute statistics over zero entries")]
    Empty,
}

/// Mean and sample standard deviation of one measurement set, in grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStatistics {
    pub mean: f64,
    pub std_dev: f64,
}

impl DerivedStatistics {
    /// Relative spread as a percentage of the mean.
    ///
    /// Returns `0.0` when the mean is zero.
    #[must_use]
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }

    /// Signed distance between the mean and the expected mass.
    #[must_use]
    pub fn accuracy_error(&self, expected_grams: f64) -> f64 {
        self.mean - expected_grams
    }
}

/// Compute the mean and sample standard deviation of `entries`.
///
/// A single entry, or any run of identical entries, yields a standard
/// deviation of exactly `0.0`.
///
/// # Errors
///
/// Returns `StatsError::Empty` if `entries` is empty.
pub fn compute_stats(entries: &[f64]) -> Result<DerivedStatistics, StatsError> {
    let Some(&first) = entries.first() else {
        return Err(StatsError::Empty);
    };

    #[allow(clippy::cast_precision_loss)]
    let n = entries.len() as f64;
    let mean = entries.iter().sum::<f64>() / n;

    // Summing identical values can drift the mean by an ulp, which would
    // leave a tiny non-zero deviation behind.
    if entries.len() == 1 || entries.iter().all(|v| *v == first) {
        return Ok(DerivedStatistics {
            mean: first,
            std_dev: 0.0,
        });
    }

    let variance = entries.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Ok(DerivedStatistics {
        mean,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn all_zero_entries_have_no_spread() {
        let stats = compute_stats(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn identical_entries_have_exact_mean_and_zero_spread() {
        for v in [0.02, 0.1, 0.2, 0.333, 1.0, 1.97, 2.0] {
            for len in [1, 3, 5] {
                let entries = vec![v; len];
                let stats = compute_stats(&entries).unwrap();
                assert_eq!(stats.mean, v, "mean of {len} x {v}");
                assert_eq!(stats.std_dev, 0.0, "std of {len} x {v}");
            }
        }
    }

    #[test]
    fn uses_sample_standard_deviation() {
        let stats = compute_stats(&[1.0, 2.0, 3.0]).unwrap();
        assert!(close(stats.mean, 2.0));
        // population convention would give sqrt(2/3) ~= 0.8165
        assert!(close(stats.std_dev, 1.0));
    }

    #[test]
    fn single_entry_does_not_divide_by_zero() {
        let stats = compute_stats(&[0.4]).unwrap();
        assert_eq!(stats.mean, 0.4);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn realistic_p200_readings() {
        let stats = compute_stats(&[0.198, 0.201, 0.203, 0.199, 0.200]).unwrap();
        assert!(close(stats.mean, 0.2002));
        assert!((stats.std_dev - 0.001_923_538).abs() < 1e-6);
        assert!(stats.accuracy_error(0.2).abs() < 1e-3);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(compute_stats(&[]), Err(StatsError::Empty));
    }

    #[test]
    fn coefficient_of_variation_handles_zero_mean() {
        let zero = compute_stats(&[0.0, 0.0]).unwrap();
        assert_eq!(zero.coefficient_of_variation(), 0.0);

        let spread = compute_stats(&[1.0, 2.0, 3.0]).unwrap();
        assert!(close(spread.coefficient_of_variation(), 50.0));
    }
}
