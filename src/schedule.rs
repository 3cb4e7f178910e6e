//! Business-hour annotation
//!
//! Parses the time-of-day column labels once per batch and tags every slot as
//! business or non-business. The result only depends on clock time, so every
//! profile in a batch shares the same [`DailySchedule`].

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BusinessHours;
use crate::error::IfeelError;

/// Format of time-of-day column labels
pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// Metadata for one time-of-day slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMeta {
    /// Original column label
    pub label: String,
    /// Parsed clock time
    pub time: NaiveTime,
    /// Whether the slot falls inside the business-hour window
    pub business_hour: bool,
}

/// Per-slot metadata shared by every profile in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    slots: Vec<SlotMeta>,
    sample_interval_hours: f64,
}

impl BusinessHours {
    /// Whether a clock time lies inside the inclusive window
    pub fn contains(&self, time: NaiveTime) -> bool {
        // Window edges are whole hours; compare seconds since midnight
        let secs = time.num_seconds_from_midnight();
        secs >= self.start_hour * 3600 && secs <= self.end_hour * 3600
    }
}

/// Parse a single `HH:MM:SS` label
pub fn parse_time_label(label: &str) -> Result<NaiveTime, IfeelError> {
    NaiveTime::parse_from_str(label.trim(), TIME_LABEL_FORMAT)
        .map_err(|e| IfeelError::ParseError(format!("'{}': {}", label, e)))
}

/// Tag each label as business (`true`) or non-business (`false`).
///
/// Fails on the first label that is not a valid `HH:MM:SS` time.
pub fn annotate_business_hours<S: AsRef<str>>(
    labels: &[S],
    window: BusinessHours,
) -> Result<Vec<bool>, IfeelError> {
    labels
        .iter()
        .map(|label| parse_time_label(label.as_ref()).map(|t| window.contains(t)))
        .collect()
}

impl DailySchedule {
    /// Build the schedule from column labels
    pub fn from_labels<S: AsRef<str>>(
        labels: &[S],
        window: BusinessHours,
    ) -> Result<Self, IfeelError> {
        window.validate()?;
        if labels.is_empty() {
            return Err(IfeelError::EmptySchedule);
        }

        let slots = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                let time = parse_time_label(label)?;
                Ok(SlotMeta {
                    label: label.to_string(),
                    time,
                    business_hour: window.contains(time),
                })
            })
            .collect::<Result<Vec<_>, IfeelError>>()?;

        let sample_interval_hours = 24.0 / slots.len() as f64;
        debug!(
            slots = slots.len(),
            sample_interval_hours,
            business_slots = slots.iter().filter(|s| s.business_hour).count(),
            "daily schedule annotated"
        );

        Ok(Self {
            slots,
            sample_interval_hours,
        })
    }

    pub fn slots(&self) -> &[SlotMeta] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Hours represented by one slot (`24 / slot_count`)
    pub fn sample_interval_hours(&self) -> f64 {
        self.sample_interval_hours
    }

    /// Business-hour flags in slot order
    pub fn business_flags(&self) -> Vec<bool> {
        self.slots.iter().map(|s| s.business_hour).collect()
    }

    /// Check that `labels` name the same clock times, in the same order, as
    /// the labels this schedule was built from.
    pub fn check_labels<S: AsRef<str>>(&self, labels: &[S]) -> Result<(), IfeelError> {
        if labels.len() != self.slots.len() {
            return Err(IfeelError::SlotCountMismatch {
                expected: self.slots.len(),
                found: labels.len(),
            });
        }
        for (slot, label) in self.slots.iter().zip(labels) {
            let label = label.as_ref();
            if parse_time_label(label)? != slot.time {
                return Err(IfeelError::InvalidConfig(format!(
                    "column '{}' does not match schedule slot '{}'",
                    label, slot.label
                )));
            }
        }
        Ok(())
    }
}
