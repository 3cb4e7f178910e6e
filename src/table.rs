//! Load table ingestion
//!
//! A load table has one row per daily profile. The first CSV column holds the
//! row identifier (a date, a household id); every other header cell is a
//! `HH:MM:SS` time-of-day label.
//!
//! Cell-level problems are recorded on the row instead of failing the whole
//! table, so that one bad day does not abort the batch.

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::IfeelError;

/// Cell spellings treated as a missing reading (case-insensitive)
const MISSING_MARKERS: [&str; 4] = ["nan", "na", "null", "none"];

/// Problem found while reading one row
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowDefect {
    #[error("cell '{value}' in column {column} is not a number")]
    UnparseableCell { column: String, value: String },

    #[error("row has {found} readings, header has {expected}")]
    WrongWidth { expected: usize, found: usize },
}

/// One daily profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRow {
    /// Row identifier from the index column
    pub id: String,
    /// Readings in slot order, `None` where missing
    pub readings: Vec<Option<f64>>,
    /// Problems found during ingestion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defects: Vec<RowDefect>,
}

impl LoadRow {
    pub fn new(id: impl Into<String>, readings: Vec<Option<f64>>) -> Self {
        Self {
            id: id.into(),
            readings,
            defects: Vec::new(),
        }
    }

    /// Row without missing readings
    pub fn from_values(id: impl Into<String>, values: &[f64]) -> Self {
        Self::new(id, values.iter().copied().map(Some).collect())
    }

    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }
}

/// Rectangular table of daily profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTable {
    /// Name of the index column
    pub index_name: String,
    /// Time-of-day labels, one per slot
    pub slot_labels: Vec<String>,
    pub rows: Vec<LoadRow>,
}

impl LoadTable {
    pub fn new(slot_labels: Vec<String>, rows: Vec<LoadRow>) -> Self {
        Self {
            index_name: String::new(),
            slot_labels,
            rows,
        }
    }

    /// Read a table from CSV
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, IfeelError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut header_cells = headers.iter();
        let index_name = header_cells.next().unwrap_or_default().to_string();
        let slot_labels: Vec<String> = header_cells.map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut cells = record.iter();
            let id = cells.next().unwrap_or_default().to_string();

            let mut row = LoadRow::new(id, Vec::with_capacity(slot_labels.len()));
            for (i, cell) in cells.enumerate() {
                match parse_reading(cell) {
                    Ok(value) => row.readings.push(value),
                    Err(()) => {
                        row.readings.push(None);
                        row.defects.push(RowDefect::UnparseableCell {
                            column: slot_labels
                                .get(i)
                                .cloned()
                                .unwrap_or_else(|| format!("#{}", i + 1)),
                            value: cell.to_string(),
                        });
                    }
                }
            }
            if row.readings.len() != slot_labels.len() {
                row.defects.push(RowDefect::WrongWidth {
                    expected: slot_labels.len(),
                    found: row.readings.len(),
                });
            }
            rows.push(row);
        }

        Ok(Self {
            index_name,
            slot_labels,
            rows,
        })
    }

    pub fn from_csv_str(data: &str) -> Result<Self, IfeelError> {
        Self::from_csv_reader(data.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hours per slot implied by the column count
    pub fn sample_interval_hours(&self) -> Option<f64> {
        if self.slot_labels.is_empty() {
            None
        } else {
            Some(24.0 / self.slot_labels.len() as f64)
        }
    }
}

fn parse_reading(cell: &str) -> Result<Option<f64>, ()> {
    if cell.is_empty()
        || MISSING_MARKERS
            .iter()
            .any(|m| cell.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(()),
    }
}
