//! Pipeline orchestration
//!
//! This module provides the public API for IFEEL.
//! It runs daily profiles from raw readings to both feature vectors.

use tracing::debug;

use crate::batch::{BatchConfig, BatchProcessor, FeatureTable};
use crate::config::ExtractionConfig;
use crate::error::IfeelError;
use crate::features::GlobalFeatureExtractor;
use crate::peak::PeakFeatureExtractor;
use crate::sax::SaxEncoder;
use crate::schedule::DailySchedule;
use crate::table::{LoadRow, LoadTable};
use crate::types::{ProfileFeatures, SymbolicProfile};

/// Extract global and peak-period features for every row of a table.
///
/// # Arguments
/// * `table` - Daily profiles with `HH:MM:SS` slot labels
/// * `config` - Alphabet size and business-hour window
///
/// # Returns
/// One feature row per input row, in input order. Rows that cannot be
/// processed are reported individually as failed.
///
/// # Example
/// ```
/// use ifeel::{extract_features, ExtractionConfig, LoadTable};
///
/// let csv = "date,00:00:00,06:00:00,12:00:00,18:00:00\n2020-01-01,1,2,4,3\n";
/// let table = LoadTable::from_csv_str(csv).unwrap();
/// let features = extract_features(&table, ExtractionConfig::new(4, 9, 17)).unwrap();
/// assert_eq!(features.rows.len(), 1);
/// ```
pub fn extract_features(
    table: &LoadTable,
    config: ExtractionConfig,
) -> Result<FeatureTable, IfeelError> {
    let pipeline = FeaturePipeline::new(config, &table.slot_labels)?;
    BatchProcessor::new(pipeline, BatchConfig::default()).process_table(table)
}

/// Batch-wide read-only state plus the per-profile stages.
///
/// Pipeline stages:
/// 1. DailySchedule - Business-hour flags and sample interval (once per batch)
/// 2. SaxEncoder - Forward fill, z-normalization, symbols, differences
/// 3. GlobalFeatureExtractor - 13 global descriptors
/// 4. PeakFeatureExtractor - 8 peak-period descriptors
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: ExtractionConfig,
    schedule: DailySchedule,
    business_flags: Vec<bool>,
    encoder: SaxEncoder,
}

impl FeaturePipeline {
    /// Validate the configuration and annotate the slot labels
    pub fn new<S: AsRef<str>>(
        config: ExtractionConfig,
        slot_labels: &[S],
    ) -> Result<Self, IfeelError> {
        config.validate()?;
        let schedule = DailySchedule::from_labels(slot_labels, config.business_hours())?;
        let encoder = SaxEncoder::new(config.alphabet_size, config.constant_profile)?;
        let business_flags = schedule.business_flags();

        debug!(
            alphabet_size = config.alphabet_size,
            slots = schedule.len(),
            "feature pipeline ready"
        );

        Ok(Self {
            config,
            schedule,
            business_flags,
            encoder,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    pub fn encoder(&self) -> &SaxEncoder {
        &self.encoder
    }

    /// Symbolic representation of one day
    pub fn transform(&self, readings: &[Option<f64>]) -> Result<SymbolicProfile, IfeelError> {
        if readings.len() != self.schedule.len() {
            return Err(IfeelError::SlotCountMismatch {
                expected: self.schedule.len(),
                found: readings.len(),
            });
        }
        self.encoder.encode(readings)
    }

    /// Both feature vectors of an already transformed day
    pub fn extract(&self, profile: &SymbolicProfile) -> ProfileFeatures {
        let interval = self.schedule.sample_interval_hours();

        let global = GlobalFeatureExtractor::extract(
            &profile.raw,
            profile.raw_diff.values(),
            interval,
            &self.business_flags,
        );
        let peak = PeakFeatureExtractor::extract(
            &profile.codes,
            &profile.code_diff,
            self.config.alphabet_size,
            interval,
        );

        ProfileFeatures { global, peak }
    }

    /// Transform and extract one day of readings
    pub fn process_profile(
        &self,
        readings: &[Option<f64>],
    ) -> Result<ProfileFeatures, IfeelError> {
        let profile = self.transform(readings)?;
        Ok(self.extract(&profile))
    }

    /// Transform one table row, rejecting rows with ingestion defects
    pub fn transform_row(&self, row: &LoadRow) -> Result<SymbolicProfile, IfeelError> {
        check_row(row)?;
        self.transform(&row.readings)
    }

    /// Transform and extract one table row
    pub fn process_row(&self, row: &LoadRow) -> Result<ProfileFeatures, IfeelError> {
        check_row(row)?;
        self.process_profile(&row.readings)
    }
}

fn check_row(row: &LoadRow) -> Result<(), IfeelError> {
    if row.is_valid() {
        return Ok(());
    }
    let reason = row
        .defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(IfeelError::InvalidRow {
        row_id: row.id.clone(),
        reason,
    })
}
