//! IFEEL - Interpretable Feature Extraction of Electricity Loads
//!
//! IFEEL turns daily electricity-load profiles into two compact feature sets
//! through a deterministic pipeline: business-hour annotation → SAX
//! transformation → global feature extraction and peak-period extraction.
//!
//! ## Feature families
//!
//! - **Global features** (13): statistics of the raw readings, such as mean,
//!   spread, shape, business-hour totals and longest periods above the mean or
//!   of successive increase
//! - **Peak-period features** (8): count, timing, duration and slopes of the
//!   runs of the highest SAX symbol
//!
//! Longest periods, peak times and durations are in hours; peak slopes are in
//! symbols per sampling interval; everything else is in the load's own unit.

pub mod batch;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod peak;
pub mod pipeline;
pub mod runs;
pub mod sax;
pub mod schedule;
pub mod table;
pub mod types;

// FFI bindings for C interop (on by default for cdylib/staticlib builds)
#[cfg(feature = "ffi")]
pub mod ffi;

pub use batch::{BatchConfig, BatchProcessor, CancellationToken, ErrorMode, FeatureTable};
pub use config::{BusinessHours, ConstantProfilePolicy, ExtractionConfig};
pub use error::IfeelError;
pub use pipeline::{extract_features, FeaturePipeline};
pub use table::{LoadRow, LoadTable};
pub use types::{
    GlobalFeatures, PeakFeatures, ProfileFeatures, SymbolicProfile, GLOBAL_FEATURE_NAMES,
    PEAK_FEATURE_NAMES,
};

/// IFEEL version
pub const IFEEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "ifeel";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureTableEncoder;
    use pretty_assertions::assert_eq;

    fn month_csv() -> String {
        let mut csv = String::from("date");
        for slot in 0..48 {
            csv.push_str(&format!(",{:02}:{:02}:00", slot / 2, (slot % 2) * 30));
        }
        csv.push('\n');
        for day in 1..=30 {
            csv.push_str(&format!("2020-06-{:02}", day));
            for slot in 0..48 {
                let hour = slot as f64 / 2.0;
                let morning = 0.3 * (-(hour - 8.0).powi(2) / 2.0).exp();
                let evening = (-(hour - 19.0).powi(2) / 3.0).exp() * (1.0 + day as f64 / 30.0);
                csv.push_str(&format!(",{:.3}", 0.2 + morning + evening));
            }
            csv.push('\n');
        }
        csv
    }

    #[test]
    fn test_end_to_end_is_idempotent() {
        let table = LoadTable::from_csv_str(&month_csv()).unwrap();
        let config = ExtractionConfig::new(7, 9, 17);

        let first = extract_features(&table, config.clone()).unwrap();
        let second = extract_features(&table, config).unwrap();

        assert_eq!(first.successful_count(), 30);
        assert_eq!(
            FeatureTableEncoder::global_csv(&first).unwrap(),
            FeatureTableEncoder::global_csv(&second).unwrap()
        );
        assert_eq!(
            FeatureTableEncoder::peak_csv(&first).unwrap(),
            FeatureTableEncoder::peak_csv(&second).unwrap()
        );
    }

    #[test]
    fn test_end_to_end_evening_peak() {
        let table = LoadTable::from_csv_str(&month_csv()).unwrap();
        let output = extract_features(&table, ExtractionConfig::new(7, 9, 17)).unwrap();

        for row in &output.rows {
            let features = row.features().unwrap();
            assert!((output.sample_interval_hours - 0.5).abs() < 1e-12);
            assert!(features.peak.has_peak());
            // The longest top-symbol run sits on the evening bump
            assert!(features.peak.peak_longest_time > 17.0);
            assert!(features.peak.peak_longest_time < 21.0);
            assert!(features.global.sum_non_business_hours > features.global.sum_business_hours);
        }
    }
}
