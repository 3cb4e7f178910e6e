//! Peak-period feature extraction
//!
//! A peak is a maximal run of slots carrying the highest SAX symbol
//! (`alphabet_size - 1`). This module reports how many peaks a day has, when
//! they occur, how long they last, and how steeply the longest one is entered
//! and left.

use crate::runs::segment_runs;
use crate::types::{DiffSeries, PeakFeatures};

/// Downward slope reported when the longest peak runs to the end of the day
pub const SLOPE_AT_DAY_END: f64 = -1.0;

/// Feature extractor for peak-period descriptors
pub struct PeakFeatureExtractor;

impl PeakFeatureExtractor {
    /// Extract peak-period features from a day's symbol codes
    pub fn extract(
        codes: &[u8],
        code_diff: &DiffSeries<i32>,
        alphabet_size: usize,
        sample_interval_hours: f64,
    ) -> PeakFeatures {
        let peak_symbol = alphabet_size.saturating_sub(1);
        let peak_slots: Vec<usize> = codes
            .iter()
            .enumerate()
            .filter(|(_, &c)| c as usize == peak_symbol)
            .map(|(i, _)| i)
            .collect();

        if peak_slots.is_empty() {
            return PeakFeatures::absent();
        }

        let runs = segment_runs(&peak_slots);
        let peak_time: Vec<f64> = runs
            .iter()
            .map(|run| center_index(run) * sample_interval_hours)
            .collect();
        let peak_duration: Vec<f64> = runs
            .iter()
            .map(|run| run.len() as f64 * sample_interval_hours)
            .collect();

        // Gaps are between already-scaled times and are scaled once more
        let peak_time_diff_shortest = peak_time
            .windows(2)
            .map(|w| w[1] - w[0])
            .reduce(f64::min)
            .map(|gap| gap * sample_interval_hours)
            .unwrap_or(f64::NAN);

        let longest = longest_run_first(&runs);
        let first = longest[0];
        let last = longest[longest.len() - 1];

        let peak_longest_slope_upward = slope_at(code_diff, first);
        let peak_longest_slope_downward = if last + 1 == codes.len() {
            SLOPE_AT_DAY_END
        } else {
            slope_at(code_diff, last + 1)
        };

        PeakFeatures {
            peak_number: runs.len(),
            peak_time,
            peak_time_diff_shortest,
            peak_duration,
            peak_longest_time: center_index(longest) * sample_interval_hours,
            peak_longest_duration: longest.len() as f64 * sample_interval_hours,
            peak_longest_slope_upward,
            peak_longest_slope_downward,
        }
    }
}

fn center_index(run: &[usize]) -> f64 {
    run.iter().sum::<usize>() as f64 / run.len() as f64
}

/// Longest run; the earliest one wins ties
fn longest_run_first<'a>(runs: &[&'a [usize]]) -> &'a [usize] {
    let mut best: &[usize] = runs[0];
    for run in &runs[1..] {
        if run.len() > best.len() {
            best = *run;
        }
    }
    best
}

/// Symbol change entering `slot`, NaN when there is no preceding slot
fn slope_at(code_diff: &DiffSeries<i32>, slot: usize) -> f64 {
    code_diff
        .at_slot(slot)
        .map(f64::from)
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(codes: &[u8], alphabet_size: usize, interval: f64) -> PeakFeatures {
        let signed: Vec<i32> = codes.iter().map(|&c| i32::from(c)).collect();
        let diff = DiffSeries::from_series(&signed);
        PeakFeatureExtractor::extract(codes, &diff, alphabet_size, interval)
    }

    #[test]
    fn test_no_peak() {
        let codes = [0, 1, 2, 3, 5, 5, 4, 2];
        let f = extract(&codes, 7, 3.0);
        assert_eq!(f.peak_number, 0);
        assert!(f.peak_time.is_empty());
        assert!(f.peak_time_diff_shortest.is_nan());
        assert!(f.peak_duration.is_empty());
        assert!(f.peak_longest_time.is_nan());
        assert!(f.peak_longest_duration.is_nan());
        assert!(f.peak_longest_slope_upward.is_nan());
        assert!(f.peak_longest_slope_downward.is_nan());
    }

    #[test]
    fn test_two_isolated_peaks() {
        let mut codes = [2u8; 24];
        codes[3] = 6;
        codes[8] = 6;
        let f = extract(&codes, 7, 1.0);

        assert_eq!(f.peak_number, 2);
        assert_eq!(f.peak_time, vec![3.0, 8.0]);
        assert_eq!(f.peak_time_diff_shortest, 5.0);
        assert_eq!(f.peak_duration, vec![1.0, 1.0]);
        // Tie on length: the first peak is the longest
        assert_eq!(f.peak_longest_time, 3.0);
        assert_eq!(f.peak_longest_duration, 1.0);
        assert_eq!(f.peak_longest_slope_upward, 4.0);
        assert_eq!(f.peak_longest_slope_downward, -4.0);
    }

    #[test]
    fn test_gap_scaled_twice() {
        // 12 slots at 2 h: peaks centred on slots 2 and 7 → times 4 h and 14 h
        let mut codes = [0u8; 12];
        codes[2] = 3;
        codes[7] = 3;
        let f = extract(&codes, 4, 2.0);
        assert_eq!(f.peak_time, vec![4.0, 14.0]);
        assert_eq!(f.peak_time_diff_shortest, 20.0);
    }

    #[test]
    fn test_longest_run_selected() {
        let codes = [0, 4, 0, 2, 4, 4, 4, 3, 4, 4, 4, 1];
        let f = extract(&codes, 5, 2.0);

        assert_eq!(f.peak_number, 3);
        assert_eq!(f.peak_time, vec![2.0, 10.0, 18.0]);
        assert_eq!(f.peak_duration, vec![2.0, 6.0, 6.0]);
        assert_eq!(f.peak_time_diff_shortest, 16.0);
        // Two runs of three: the earlier one (slots 4-6) wins
        assert_eq!(f.peak_longest_time, 10.0);
        assert_eq!(f.peak_longest_duration, 6.0);
        assert_eq!(f.peak_longest_slope_upward, 2.0);
        assert_eq!(f.peak_longest_slope_downward, -1.0);
    }

    #[test]
    fn test_single_peak_has_no_gap() {
        let codes = [1, 2, 2, 1, 0, 0];
        let f = extract(&codes, 3, 4.0);
        assert_eq!(f.peak_number, 1);
        assert!(f.peak_time_diff_shortest.is_nan());
        assert_eq!(f.peak_time, vec![6.0]);
        assert_eq!(f.peak_duration, vec![8.0]);
    }

    #[test]
    fn test_peak_at_day_end_uses_sentinel() {
        let codes = [0, 0, 1, 2, 2, 2];
        let f = extract(&codes, 3, 4.0);
        assert_eq!(f.peak_number, 1);
        assert_eq!(f.peak_longest_slope_upward, 1.0);
        assert_eq!(f.peak_longest_slope_downward, SLOPE_AT_DAY_END);
    }

    #[test]
    fn test_peak_at_day_start_has_no_upward_slope() {
        let codes = [2, 2, 1, 0];
        let f = extract(&codes, 3, 6.0);
        assert!(f.peak_longest_slope_upward.is_nan());
        assert_eq!(f.peak_longest_slope_downward, -1.0);
        assert_eq!(f.peak_longest_time, 3.0);
    }

    #[test]
    fn test_whole_day_peak() {
        let codes = [1u8; 4];
        let f = extract(&codes, 2, 6.0);
        assert_eq!(f.peak_number, 1);
        assert_eq!(f.peak_longest_duration, 24.0);
        assert!(f.peak_longest_slope_upward.is_nan());
        assert_eq!(f.peak_longest_slope_downward, SLOPE_AT_DAY_END);
    }
}
