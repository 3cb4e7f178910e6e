//! Symbolic Aggregate approXimation (SAX)
//!
//! Turns one day of readings into its symbolic representation:
//! forward fill → z-normalization → breakpoint lookup → letters, plus the
//! first differences of the raw readings and the symbol codes.

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::config::ConstantProfilePolicy;
use crate::error::IfeelError;
use crate::types::{DiffSeries, SymbolicProfile};

/// Ordinal alphabet: code 0 → 'a', code 26 → 'A'
const LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest supported alphabet
pub const MAX_ALPHABET_SIZE: usize = LETTERS.len();

/// Equal-probability breakpoints under N(0, 1).
///
/// Returns `alphabet_size - 1` finite, strictly increasing thresholds at the
/// quantiles `k / alphabet_size`. The implicit final threshold is +∞.
pub fn breakpoints(alphabet_size: usize) -> Result<Vec<f64>, IfeelError> {
    if !(2..=MAX_ALPHABET_SIZE).contains(&alphabet_size) {
        return Err(IfeelError::InvalidConfig(format!(
            "alphabet_size must be within 2-{}, got {}",
            MAX_ALPHABET_SIZE, alphabet_size
        )));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| IfeelError::BreakpointError(e.to_string()))?;
    let a = alphabet_size as f64;
    let cuts: Vec<f64> = (1..alphabet_size)
        .map(|k| normal.inverse_cdf(k as f64 / a))
        .collect();

    if cuts.iter().any(|c| !c.is_finite()) || cuts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(IfeelError::BreakpointError(format!(
            "non-increasing breakpoints for alphabet size {}",
            alphabet_size
        )));
    }
    Ok(cuts)
}

/// Letter for a symbol code
pub fn code_to_letter(code: u8) -> char {
    LETTERS
        .get(code as usize)
        .map(|&b| b as char)
        .unwrap_or('?')
}

/// Replace each missing reading with the nearest preceding reading.
///
/// Missing readings before the first present one stay `None`.
pub fn forward_fill(readings: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    readings
        .iter()
        .map(|r| {
            if r.is_some() {
                last = *r;
            }
            last
        })
        .collect()
}

/// Population mean and standard deviation
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Z-normalize with the series' own mean and population std.
///
/// A series without usable spread is handled by `policy`: all readings equal
/// (including a single reading), or a standard deviation that is zero or not
/// finite after rounding.
pub fn z_normalize(values: &[f64], policy: ConstantProfilePolicy) -> Result<Vec<f64>, IfeelError> {
    let degenerate = |policy: ConstantProfilePolicy| match policy {
        ConstantProfilePolicy::ZeroFill => Ok(vec![0.0; values.len()]),
        ConstantProfilePolicy::Reject => Err(IfeelError::DegenerateProfile),
    };

    if values.windows(2).all(|w| w[0] == w[1]) {
        return degenerate(policy);
    }

    let (mean, std) = mean_std(values);
    if std == 0.0 || !std.is_finite() {
        return degenerate(policy);
    }
    Ok(values.iter().map(|v| (v - mean) / std).collect())
}

/// SAX encoder with precomputed breakpoints
#[derive(Debug, Clone)]
pub struct SaxEncoder {
    alphabet_size: usize,
    breakpoints: Vec<f64>,
    constant_policy: ConstantProfilePolicy,
}

impl SaxEncoder {
    pub fn new(
        alphabet_size: usize,
        constant_policy: ConstantProfilePolicy,
    ) -> Result<Self, IfeelError> {
        let breakpoints = breakpoints(alphabet_size)?;
        debug!(alphabet_size, ?breakpoints, "SAX breakpoints computed");
        Ok(Self {
            alphabet_size,
            breakpoints,
            constant_policy,
        })
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    /// Code of a normalized value: index of the first breakpoint strictly
    /// greater than it, or the top code when none is.
    pub fn discretize(&self, value: f64) -> u8 {
        let code = self
            .breakpoints
            .iter()
            .position(|&b| b > value)
            .unwrap_or(self.alphabet_size - 1);
        code as u8
    }

    /// Encode one day of readings
    pub fn encode(&self, readings: &[Option<f64>]) -> Result<SymbolicProfile, IfeelError> {
        let filled = forward_fill(readings);
        let undefined = filled.iter().take_while(|r| r.is_none()).count();
        if undefined > 0 {
            return Err(IfeelError::UndefinedLeadingReadings { count: undefined });
        }
        let raw: Vec<f64> = filled.into_iter().flatten().collect();
        if let Some(slot) = raw.iter().position(|v| !v.is_finite()) {
            return Err(IfeelError::NonFiniteReading { slot });
        }

        let normalized = z_normalize(&raw, self.constant_policy)?;
        let codes: Vec<u8> = normalized.iter().map(|&v| self.discretize(v)).collect();
        let letters = codes.iter().map(|&c| code_to_letter(c)).collect();

        let signed: Vec<i32> = codes.iter().map(|&c| i32::from(c)).collect();
        let code_diff = DiffSeries::from_series(&signed);
        let raw_diff = DiffSeries::from_series(&raw);

        Ok(SymbolicProfile {
            raw,
            normalized,
            raw_diff,
            codes,
            letters,
            code_diff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_breakpoints_alphabet_7() {
        let cuts = breakpoints(7).unwrap();
        assert_eq!(cuts.len(), 6);
        assert!(cuts.iter().all(|c| c.is_finite()));
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
        // Symmetric around zero
        assert!((cuts[0] + cuts[5]).abs() < 1e-9);
        assert!((cuts[0] - (-1.0676)).abs() < 1e-3);
    }

    #[test]
    fn test_breakpoints_alphabet_2_and_4() {
        let cuts = breakpoints(2).unwrap();
        assert_eq!(cuts.len(), 1);
        assert!(cuts[0].abs() < 1e-9);

        let cuts = breakpoints(4).unwrap();
        assert!((cuts[0] + 0.6745).abs() < 1e-3);
        assert!((cuts[2] - 0.6745).abs() < 1e-3);
    }

    #[test]
    fn test_breakpoints_invalid_alphabet() {
        assert!(breakpoints(1).is_err());
        assert!(breakpoints(53).is_err());
    }

    #[test]
    fn test_discretize_ties_resolve_low() {
        let encoder = SaxEncoder::new(4, ConstantProfilePolicy::ZeroFill).unwrap();
        let cut = encoder.breakpoints()[0];
        assert_eq!(encoder.discretize(cut), 1);
        assert_eq!(encoder.discretize(cut - 1e-9), 0);
        assert_eq!(encoder.discretize(-100.0), 0);
        assert_eq!(encoder.discretize(100.0), 3);
    }

    #[test]
    fn test_codes_in_range() {
        let encoder = SaxEncoder::new(7, ConstantProfilePolicy::ZeroFill).unwrap();
        let readings: Vec<f64> = (0..48).map(|i| ((i as f64) / 3.0).sin() * 5.0 + 10.0).collect();
        let profile = encoder.encode(&present(&readings)).unwrap();

        assert_eq!(profile.codes.len(), 48);
        assert!(profile.codes.iter().all(|&c| c <= 6));
        assert!(profile.codes.contains(&0));
        assert!(profile.codes.contains(&6));
        assert_eq!(profile.raw_diff.len(), 47);
        assert_eq!(profile.code_diff.len(), 47);
    }

    #[test]
    fn test_letters_follow_codes() {
        let encoder = SaxEncoder::new(3, ConstantProfilePolicy::ZeroFill).unwrap();
        let profile = encoder.encode(&present(&[0.0, 0.0, 10.0, 20.0, 20.0])).unwrap();
        assert_eq!(profile.word().len(), 5);
        for (code, letter) in profile.codes.iter().zip(&profile.letters) {
            assert_eq!(*letter, (b'a' + code) as char);
        }
        assert_eq!(profile.letters[0], 'a');
        assert_eq!(profile.letters[4], 'c');
    }

    #[test]
    fn test_code_to_letter_upper_range() {
        assert_eq!(code_to_letter(0), 'a');
        assert_eq!(code_to_letter(25), 'z');
        assert_eq!(code_to_letter(26), 'A');
        assert_eq!(code_to_letter(51), 'Z');
    }

    #[test]
    fn test_diff_series() {
        let encoder = SaxEncoder::new(3, ConstantProfilePolicy::ZeroFill).unwrap();
        let profile = encoder.encode(&present(&[1.0, 3.0, 2.0, 6.0])).unwrap();
        assert_eq!(profile.raw_diff.values(), &[2.0, -1.0, 4.0]);
        let expected: Vec<i32> = profile
            .codes
            .windows(2)
            .map(|w| i32::from(w[1]) - i32::from(w[0]))
            .collect();
        assert_eq!(profile.code_diff.values(), expected.as_slice());
    }

    #[test]
    fn test_forward_fill() {
        let filled = forward_fill(&[None, Some(1.0), None, None, Some(4.0), None]);
        assert_eq!(
            filled,
            vec![None, Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]
        );
    }

    #[test]
    fn test_leading_missing_rejected() {
        let encoder = SaxEncoder::new(7, ConstantProfilePolicy::ZeroFill).unwrap();
        let result = encoder.encode(&[None, None, Some(1.0), Some(2.0)]);
        assert!(matches!(
            result,
            Err(IfeelError::UndefinedLeadingReadings { count: 2 })
        ));
    }

    #[test]
    fn test_interior_missing_filled() {
        let encoder = SaxEncoder::new(7, ConstantProfilePolicy::ZeroFill).unwrap();
        let profile = encoder
            .encode(&[Some(1.0), None, Some(3.0), None])
            .unwrap();
        assert_eq!(profile.raw, vec![1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_z_normalize_population_std() {
        let z = z_normalize(&[1.0, 2.0, 3.0, 4.0, 5.0], ConstantProfilePolicy::Reject).unwrap();
        let s2 = 2.0_f64.sqrt();
        assert!((z[0] + 2.0 / s2).abs() < 1e-12);
        assert!(z[2].abs() < 1e-12);
        assert!((z[4] - 2.0 / s2).abs() < 1e-12);
    }

    #[test]
    fn test_constant_profile_policies() {
        let zero = SaxEncoder::new(7, ConstantProfilePolicy::ZeroFill).unwrap();
        let profile = zero.encode(&present(&[2.5; 24])).unwrap();
        assert!(profile.normalized.iter().all(|&v| v == 0.0));
        // Zero sits in the middle bin of an odd alphabet
        assert!(profile.codes.iter().all(|&c| c == 3));

        let reject = SaxEncoder::new(7, ConstantProfilePolicy::Reject).unwrap();
        assert!(matches!(
            reject.encode(&present(&[2.5; 24])),
            Err(IfeelError::DegenerateProfile)
        ));
    }

    #[test]
    fn test_underflowing_spread_is_degenerate() {
        // Distinct values whose variance rounds to zero
        let readings = present(&[0.0, 5e-324]);

        let zero = SaxEncoder::new(4, ConstantProfilePolicy::ZeroFill).unwrap();
        let profile = zero.encode(&readings).unwrap();
        assert_eq!(profile.normalized, vec![0.0, 0.0]);
        assert_eq!(profile.codes, vec![2, 2]);

        let reject = SaxEncoder::new(4, ConstantProfilePolicy::Reject).unwrap();
        assert!(matches!(
            reject.encode(&readings),
            Err(IfeelError::DegenerateProfile)
        ));
    }

    #[test]
    fn test_overflowing_spread_is_degenerate() {
        let result = z_normalize(&[f64::MAX, -f64::MAX, f64::MAX], ConstantProfilePolicy::Reject);
        assert!(matches!(result, Err(IfeelError::DegenerateProfile)));
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let encoder = SaxEncoder::new(7, ConstantProfilePolicy::ZeroFill).unwrap();
        let result = encoder.encode(&[Some(1.0), Some(f64::INFINITY), Some(3.0)]);
        assert!(matches!(
            result,
            Err(IfeelError::NonFiniteReading { slot: 1 })
        ));
    }
}
