//! Global feature extraction
//!
//! This module computes the 13 global descriptors of a daily profile from its
//! raw readings and their first difference:
//! - Location and spread (mean, std, max, min, range)
//! - Business vs non-business load totals
//! - Shape (skewness, kurtosis, histogram mode)
//! - Longest periods above the mean and of successive increase, in hours
//!
//! Every feature is computed independently of the others.

use crate::runs::longest_run;
use crate::types::GlobalFeatures;

/// Number of equal-width bins of the mode histogram
const HISTOGRAM_BINS: usize = 5;

/// Feature extractor for the global descriptors
pub struct GlobalFeatureExtractor;

impl GlobalFeatureExtractor {
    /// Extract global features.
    ///
    /// `business_hours` is the per-slot flag sequence of the batch schedule;
    /// `raw_diff` is the first difference of `raw`.
    pub fn extract(
        raw: &[f64],
        raw_diff: &[f64],
        sample_interval_hours: f64,
        business_hours: &[bool],
    ) -> GlobalFeatures {
        let max = compute_max(raw);
        let min = compute_min(raw);

        GlobalFeatures {
            mean: compute_mean(raw),
            std: compute_std(raw),
            max,
            min,
            range: max - min,
            percentage_above_mean: compute_percentage_above_mean(raw),
            sum_business_hours: compute_sum_where(raw, business_hours, true),
            sum_non_business_hours: compute_sum_where(raw, business_hours, false),
            skewness: compute_skewness(raw),
            kurtosis: compute_kurtosis(raw),
            mode_5_bin_histogram: compute_histogram_mode(raw, HISTOGRAM_BINS),
            longest_period_above_mean: compute_longest_period_above_mean(
                raw,
                sample_interval_hours,
            ),
            longest_period_successive_increase: compute_longest_period_of_increase(
                raw_diff,
                sample_interval_hours,
            ),
        }
    }
}

fn compute_mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Central moment of order `k` (population, divide by N)
fn central_moment(x: &[f64], k: i32) -> f64 {
    let mean = compute_mean(x);
    x.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / x.len() as f64
}

/// Population standard deviation
fn compute_std(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    central_moment(x, 2).sqrt()
}

fn compute_max(x: &[f64]) -> f64 {
    x.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

fn compute_min(x: &[f64]) -> f64 {
    x.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

/// Fraction of slots strictly above the mean
fn compute_percentage_above_mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let mean = compute_mean(x);
    x.iter().filter(|&&v| v > mean).count() as f64 / x.len() as f64
}

/// Sum of readings whose business-hour flag equals `business`
fn compute_sum_where(x: &[f64], flags: &[bool], business: bool) -> f64 {
    x.iter()
        .zip(flags)
        .filter(|(_, &flag)| flag == business)
        .map(|(v, _)| v)
        .sum()
}

/// Biased sample skewness `m3 / m2^1.5`; NaN when the variance is zero
fn compute_skewness(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(x, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(x, 3) / m2.powf(1.5)
}

/// Biased excess kurtosis `m4 / m2^2 - 3`; NaN when the variance is zero
fn compute_kurtosis(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(x, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(x, 4) / (m2 * m2) - 3.0
}

/// Midpoint of the most populated equal-width bin over `[min, max]`.
///
/// The first bin wins ties. The last bin is closed on the right, and a
/// zero-width range is widened to `[min - 0.5, max + 0.5]`.
fn compute_histogram_mode(x: &[f64], bins: usize) -> f64 {
    if x.is_empty() || bins == 0 {
        return f64::NAN;
    }

    let (mut lo, mut hi) = (compute_min(x), compute_max(x));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for &v in x {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        // Guard against rounding placing a value one bin off its edges
        let bin = if v < edges[bin] && bin > 0 {
            bin - 1
        } else if bin + 1 < bins && v >= edges[bin + 1] {
            bin + 1
        } else {
            bin
        };
        counts[bin] += 1;
    }

    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    (edges[best] + edges[best + 1]) / 2.0
}

/// Hours of the longest run strictly above the mean; 0 for an empty series
fn compute_longest_period_above_mean(x: &[f64], sample_interval_hours: f64) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mean = compute_mean(x);
    sample_interval_hours * longest_run(x.iter().map(|&v| v > mean)) as f64
}

/// Hours of the longest run of positive differences; 0 for an empty diff
fn compute_longest_period_of_increase(diff: &[f64], sample_interval_hours: f64) -> f64 {
    if diff.is_empty() {
        return 0.0;
    }
    sample_interval_hours * longest_run(diff.iter().map(|&d| d > 0.0)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(x: &[f64]) -> Vec<f64> {
        x.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn test_basic_statistics() {
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 1.0, &[true; 5]);

        assert!((f.mean - 3.0).abs() < 1e-12);
        assert!((f.std - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(f.max, 5.0);
        assert_eq!(f.min, 1.0);
        assert_eq!(f.range, 4.0);
        assert!((f.percentage_above_mean - 0.4).abs() < 1e-12);
        assert_eq!(f.sum_business_hours, 15.0);
        assert_eq!(f.sum_non_business_hours, 0.0);
    }

    #[test]
    fn test_shape_statistics() {
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 1.0, &[true; 5]);

        assert!(f.skewness.abs() < 1e-12);
        // m4 / m2^2 = 6.8 / 4 = 1.7
        assert!((f.kurtosis - (1.7 - 3.0)).abs() < 1e-12);

        let skewed = [0.0, 0.0, 0.0, 0.0, 10.0];
        let f = GlobalFeatureExtractor::extract(&skewed, &diff(&skewed), 1.0, &[true; 5]);
        // m2 = 16, m3 = 96 → 96 / 64
        assert!((f.skewness - 1.5).abs() < 1e-12);
        // m4 = 832 → 832 / 256 - 3
        assert!((f.kurtosis - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_business_split() {
        let raw = [1.0, 2.0, 3.0, 4.0];
        let flags = [false, true, true, false];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 6.0, &flags);
        assert_eq!(f.sum_business_hours, 5.0);
        assert_eq!(f.sum_non_business_hours, 5.0);
    }

    #[test]
    fn test_histogram_mode() {
        // Edges 0, 2, 4, 6, 8, 10; third bin [4, 6) holds three values
        let raw = [0.0, 4.5, 5.0, 5.5, 10.0];
        assert!((compute_histogram_mode(&raw, 5) - 5.0).abs() < 1e-12);

        // Max lands in the closed last bin
        let raw = [0.0, 10.0, 10.0];
        assert!((compute_histogram_mode(&raw, 5) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_mode_tie_takes_first_bin() {
        let raw = [0.0, 1.0, 9.0, 10.0];
        assert!((compute_histogram_mode(&raw, 5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_mode_constant() {
        // Range widened to [2.5, 3.5]; all values in the middle bin
        let raw = [3.0, 3.0, 3.0];
        assert!((compute_histogram_mode(&raw, 5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_longest_periods() {
        let raw = [1.0, 5.0, 6.0, 7.0, 1.0, 2.0, 8.0, 1.0];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 0.5, &[false; 8]);
        // mean 3.875: run of three above-mean slots
        assert!((f.longest_period_above_mean - 1.5).abs() < 1e-12);
        // diffs: +4 +1 +1 -6 +1 +6 -7 → run of three
        assert!((f.longest_period_successive_increase - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_longest_period_never_increasing() {
        let raw = [5.0, 4.0, 3.0];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 1.0, &[true; 3]);
        assert_eq!(f.longest_period_successive_increase, 0.0);
    }

    #[test]
    fn test_empty_series() {
        let f = GlobalFeatureExtractor::extract(&[], &[], 1.0, &[]);
        assert!(f.mean.is_nan());
        assert!(f.std.is_nan());
        assert!(f.max.is_nan());
        assert!(f.mode_5_bin_histogram.is_nan());
        assert_eq!(f.sum_business_hours, 0.0);
        assert_eq!(f.longest_period_above_mean, 0.0);
        assert_eq!(f.longest_period_successive_increase, 0.0);
    }

    #[test]
    fn test_constant_series_shape_undefined() {
        let raw = [2.0; 6];
        let f = GlobalFeatureExtractor::extract(&raw, &diff(&raw), 4.0, &[true; 6]);
        assert_eq!(f.std, 0.0);
        assert!(f.skewness.is_nan());
        assert!(f.kurtosis.is_nan());
        assert_eq!(f.percentage_above_mean, 0.0);
        assert_eq!(f.longest_period_above_mean, 0.0);
    }
}
