//! Core types for the IFEEL pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: the symbolic representation of one day, and the two feature
//! vectors extracted from it.

use serde::{Deserialize, Serialize};

/// Names of the 13 global features, in column order
pub const GLOBAL_FEATURE_NAMES: [&str; 13] = [
    "Mean",
    "Std",
    "Max",
    "Min",
    "Range (i.e., max-min)",
    "Percentage above mean",
    "Sum of net loads during business hours",
    "Sum of net loads during non-business hours",
    "Skewness",
    "Kurtosis",
    "Mode of 5-bin histogram",
    "Longest period above mean",
    "Longest period of successive increase",
];

/// Names of the 8 peak-period features, in column order
pub const PEAK_FEATURE_NAMES: [&str; 8] = [
    "Peak_all: number",
    "Peak_all: time",
    "Peak_all: shortest interval between two peaks",
    "Peak_all: duration",
    "Peak_longest: occurrence time",
    "Peak_longest: duration",
    "Peak_longest: upward slope",
    "Peak_longest: downward slope",
];

/// First difference of a series, aligned to slots `1..N`.
///
/// `values[i]` holds `series[i + 1] - series[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffSeries<T> {
    values: Vec<T>,
}

impl<T> DiffSeries<T>
where
    T: Copy + std::ops::Sub<Output = T>,
{
    /// Difference each element with its predecessor
    pub fn from_series(series: &[T]) -> Self {
        Self {
            values: series.windows(2).map(|w| w[1] - w[0]).collect(),
        }
    }
}

impl<T: Copy> DiffSeries<T> {
    /// Difference entering `slot`; `None` for slot 0 or past the end
    pub fn at_slot(&self, slot: usize) -> Option<T> {
        slot.checked_sub(1).and_then(|i| self.values.get(i).copied())
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Symbolic representation of one daily profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicProfile {
    /// Forward-filled readings
    pub raw: Vec<f64>,
    /// Z-normalized readings
    pub normalized: Vec<f64>,
    /// First difference of the raw readings
    pub raw_diff: DiffSeries<f64>,
    /// SAX symbol codes in `[0, alphabet_size - 1]`
    pub codes: Vec<u8>,
    /// SAX letters, one per code
    pub letters: Vec<char>,
    /// First difference of the symbol codes
    pub code_diff: DiffSeries<i32>,
}

impl SymbolicProfile {
    /// SAX word as a string
    pub fn word(&self) -> String {
        self.letters.iter().collect()
    }
}

/// The 13 global features of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalFeatures {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
    pub range: f64,
    pub percentage_above_mean: f64,
    pub sum_business_hours: f64,
    pub sum_non_business_hours: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub mode_5_bin_histogram: f64,
    /// Hours
    pub longest_period_above_mean: f64,
    /// Hours
    pub longest_period_successive_increase: f64,
}

impl GlobalFeatures {
    /// Values in [`GLOBAL_FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; 13] {
        [
            self.mean,
            self.std,
            self.max,
            self.min,
            self.range,
            self.percentage_above_mean,
            self.sum_business_hours,
            self.sum_non_business_hours,
            self.skewness,
            self.kurtosis,
            self.mode_5_bin_histogram,
            self.longest_period_above_mean,
            self.longest_period_successive_increase,
        ]
    }
}

/// The 8 peak-period features of one day.
///
/// When no peak symbol occurs, `peak_number` is 0, scalars are NaN and the
/// sequences are empty. Times and durations are in hours; slopes are in
/// symbols per sampling interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakFeatures {
    pub peak_number: usize,
    pub peak_time: Vec<f64>,
    pub peak_time_diff_shortest: f64,
    pub peak_duration: Vec<f64>,
    pub peak_longest_time: f64,
    pub peak_longest_duration: f64,
    pub peak_longest_slope_upward: f64,
    pub peak_longest_slope_downward: f64,
}

impl PeakFeatures {
    /// Feature vector for a day without any peak symbol
    pub fn absent() -> Self {
        Self {
            peak_number: 0,
            peak_time: Vec::new(),
            peak_time_diff_shortest: f64::NAN,
            peak_duration: Vec::new(),
            peak_longest_time: f64::NAN,
            peak_longest_duration: f64::NAN,
            peak_longest_slope_upward: f64::NAN,
            peak_longest_slope_downward: f64::NAN,
        }
    }

    pub fn has_peak(&self) -> bool {
        self.peak_number > 0
    }
}

/// Both feature vectors of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub global: GlobalFeatures,
    pub peak: PeakFeatures,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_series_alignment() {
        let diff = DiffSeries::from_series(&[1.0, 4.0, 2.0, 2.5]);
        assert_eq!(diff.values(), &[3.0, -2.0, 0.5]);
        assert_eq!(diff.at_slot(0), None);
        assert_eq!(diff.at_slot(1), Some(3.0));
        assert_eq!(diff.at_slot(3), Some(0.5));
        assert_eq!(diff.at_slot(4), None);
    }

    #[test]
    fn test_diff_series_short_inputs() {
        assert!(DiffSeries::<i32>::from_series(&[]).is_empty());
        assert!(DiffSeries::from_series(&[7]).is_empty());
    }

    #[test]
    fn test_absent_peak() {
        let peak = PeakFeatures::absent();
        assert!(!peak.has_peak());
        assert!(peak.peak_time_diff_shortest.is_nan());
        assert!(peak.peak_longest_slope_downward.is_nan());
    }
}
