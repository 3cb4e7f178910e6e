//! Extraction configuration
//!
//! All three core parameters are required; only the constant-profile policy
//! has a default.

use serde::{Deserialize, Serialize};

use crate::error::IfeelError;
use crate::sax::MAX_ALPHABET_SIZE;

/// How z-normalization treats a profile whose readings are all equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantProfilePolicy {
    /// Emit an all-zero normalized series.
    #[default]
    ZeroFill,
    /// Fail the profile with [`IfeelError::DegenerateProfile`].
    Reject,
}

/// Inclusive business-hour window `[start_hour:00:00, end_hour:00:00]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl BusinessHours {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn validate(&self) -> Result<(), IfeelError> {
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(IfeelError::InvalidConfig(format!(
                "business hours must be within 0-23, got {}-{}",
                self.start_hour, self.end_hour
            )));
        }
        if self.start_hour > self.end_hour {
            return Err(IfeelError::InvalidConfig(format!(
                "business hour start {} is after end {}",
                self.start_hour, self.end_hour
            )));
        }
        Ok(())
    }
}

/// Parameters of the symbolic transformation and feature extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Number of SAX symbols (2-52)
    pub alphabet_size: usize,
    /// First business hour (inclusive, 0-23)
    pub business_hour_start: u32,
    /// Last business hour (inclusive, 0-23)
    pub business_hour_end: u32,
    /// Treatment of constant-valued days
    #[serde(default)]
    pub constant_profile: ConstantProfilePolicy,
}

impl ExtractionConfig {
    pub fn new(alphabet_size: usize, business_hour_start: u32, business_hour_end: u32) -> Self {
        Self {
            alphabet_size,
            business_hour_start,
            business_hour_end,
            constant_profile: ConstantProfilePolicy::default(),
        }
    }

    pub fn with_constant_profile(mut self, policy: ConstantProfilePolicy) -> Self {
        self.constant_profile = policy;
        self
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, IfeelError> {
        let config: ExtractionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn business_hours(&self) -> BusinessHours {
        BusinessHours::new(self.business_hour_start, self.business_hour_end)
    }

    pub fn validate(&self) -> Result<(), IfeelError> {
        if self.alphabet_size < 2 || self.alphabet_size > MAX_ALPHABET_SIZE {
            return Err(IfeelError::InvalidConfig(format!(
                "alphabet_size must be within 2-{}, got {}",
                MAX_ALPHABET_SIZE, self.alphabet_size
            )));
        }
        self.business_hours().validate()
    }
}
