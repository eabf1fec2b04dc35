//! Summary Statistics
//!
//! Descriptive statistics over a handful of repeated timings (typically the
//! baseline runs). No outlier rejection: with three samples there is nothing
//! robust to reject against.

use serde::Serialize;

/// Summary of repeated timings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median (mean of the two middle values for even counts)
    pub median: f64,
    /// Sample standard deviation (0 for a single sample)
    pub std_dev: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Number of samples
    pub count: usize,
}

impl TimingSummary {
    /// Coefficient of variation in percent
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }
}

/// Arithmetic mean, `None` for no samples
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// Summarize samples, `None` when there are none
pub fn compute_summary(samples: &[f64]) -> Option<TimingSummary> {
    let mean = mean(samples)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    let std_dev = if n < 2 {
        0.0
    } else {
        let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    Some(TimingSummary {
        mean,
        median,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        count: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_runs() {
        let summary = compute_summary(&[12.0, 14.0, 13.0]).unwrap();
        assert!((summary.mean - 13.0).abs() < f64::EPSILON);
        assert!((summary.median - 13.0).abs() < f64::EPSILON);
        assert!((summary.std_dev - 1.0).abs() < 1e-12);
        assert_eq!(summary.min, 12.0);
        assert_eq!(summary.max, 14.0);
        assert_eq!(summary.count, 3);
    }

    #[test]
    fn test_even_count_median() {
        let summary = compute_summary(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!((summary.median - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_sample() {
        let summary = compute_summary(&[17.8]).unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.coefficient_of_variation(), 0.0);
    }

    #[test]
    fn test_empty_samples() {
        assert!(compute_summary(&[]).is_none());
        assert!(mean(&[]).is_none());
    }
}
