//! Error types for IFEEL

use thiserror::Error;

/// Errors that can occur during transformation and feature extraction
#[derive(Debug, Error)]
pub enum IfeelError {
    #[error("Failed to parse time-of-day label: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Daily schedule has no time slots")]
    EmptySchedule,

    #[error("Profile has {found} readings, schedule expects {expected}")]
    SlotCountMismatch { expected: usize, found: usize },

    #[error("{count} leading reading(s) are missing and cannot be forward-filled")]
    UndefinedLeadingReadings { count: usize },

    #[error("Reading at slot {slot} is not a finite number")]
    NonFiniteReading { slot: usize },

    #[error("Constant-valued profile cannot be z-normalized")]
    DegenerateProfile,

    #[error("Invalid row {row_id}: {reason}")]
    InvalidRow { row_id: String, reason: String },

    #[error("Breakpoint computation failed: {0}")]
    BreakpointError(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("Row {index} failed: {message}")]
    RowFailed { index: usize, message: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
