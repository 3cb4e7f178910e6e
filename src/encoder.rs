//! Feature table encoding
//!
//! This module writes feature tables as CSV (one table per feature family, the
//! row identifier first and the fixed feature names after), JSON or NDJSON.
//! Only extracted rows appear in the CSV tables; failed and skipped rows are
//! reported through [`FeatureTable::failures`] and the JSON encodings.

use serde::{Deserialize, Serialize};

use crate::batch::FeatureTable;
use crate::error::IfeelError;
use crate::types::{PeakFeatures, SymbolicProfile, GLOBAL_FEATURE_NAMES, PEAK_FEATURE_NAMES};

/// Which representation of the SAX word to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFormat {
    #[default]
    Letters,
    Codes,
}

/// Encoder for feature tables
pub struct FeatureTableEncoder;

impl FeatureTableEncoder {
    /// Global feature table as CSV
    pub fn global_csv(table: &FeatureTable) -> Result<String, IfeelError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(header(&table.index_name, &GLOBAL_FEATURE_NAMES))?;

        for row in &table.rows {
            if let Some(features) = row.features() {
                let mut record = vec![row.id.clone()];
                record.extend(features.global.to_array().iter().map(|v| format_value(*v)));
                writer.write_record(&record)?;
            }
        }
        finish(writer)
    }

    /// Peak-period feature table as CSV
    pub fn peak_csv(table: &FeatureTable) -> Result<String, IfeelError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(header(&table.index_name, &PEAK_FEATURE_NAMES))?;

        for row in &table.rows {
            if let Some(features) = row.features() {
                let mut record = vec![row.id.clone()];
                record.extend(peak_cells(&features.peak));
                writer.write_record(&record)?;
            }
        }
        finish(writer)
    }

    /// Whole table as a JSON document
    pub fn to_json(table: &FeatureTable, pretty: bool) -> Result<String, IfeelError> {
        let json = if pretty {
            serde_json::to_string_pretty(table)?
        } else {
            serde_json::to_string(table)?
        };
        Ok(json)
    }

    /// One JSON object per row
    pub fn to_ndjson(table: &FeatureTable) -> Result<String, IfeelError> {
        let mut out = String::new();
        for row in &table.rows {
            out.push_str(&serde_json::to_string(row)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// SAX words as CSV, one column per slot
    pub fn symbolic_csv(
        index_name: &str,
        slot_labels: &[String],
        rows: &[(String, SymbolicProfile)],
        format: SymbolFormat,
    ) -> Result<String, IfeelError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let labels: Vec<&str> = slot_labels.iter().map(String::as_str).collect();
        writer.write_record(header(index_name, &labels))?;

        for (id, profile) in rows {
            let mut record = vec![id.clone()];
            match format {
                SymbolFormat::Letters => {
                    record.extend(profile.letters.iter().map(char::to_string))
                }
                SymbolFormat::Codes => record.extend(profile.codes.iter().map(u8::to_string)),
            }
            writer.write_record(&record)?;
        }
        finish(writer)
    }
}

fn header(index_name: &str, names: &[&str]) -> Vec<String> {
    std::iter::once(index_name.to_string())
        .chain(names.iter().map(|n| n.to_string()))
        .collect()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, IfeelError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| IfeelError::CsvError(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn format_value(value: f64) -> String {
    format!("{}", value)
}

/// Sequence cell: `[a, b]`, or NaN when the day has no peak
fn format_sequence(values: &[f64]) -> String {
    if values.is_empty() {
        return format_value(f64::NAN);
    }
    let parts: Vec<String> = values.iter().map(|v| format_value(*v)).collect();
    format!("[{}]", parts.join(", "))
}

fn peak_cells(peak: &PeakFeatures) -> Vec<String> {
    vec![
        peak.peak_number.to_string(),
        format_sequence(&peak.peak_time),
        format_value(peak.peak_time_diff_shortest),
        format_sequence(&peak.peak_duration),
        format_value(peak.peak_longest_time),
        format_value(peak.peak_longest_duration),
        format_value(peak.peak_longest_slope_upward),
        format_value(peak.peak_longest_slope_downward),
    ]
}
