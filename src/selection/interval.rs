//! Time intervals and fixed-precision quantization
//!
//! Values shown in the range control and values passed to the audio engine
//! go through the same [`Precision`], so the two never drift apart.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CropError, Result};

/// Default number of decimal places kept for interval bounds
pub const DEFAULT_PRECISION_DIGITS: u32 = 2;

/// Largest supported number of decimal places
pub const MAX_PRECISION_DIGITS: u32 = 6;

// Absorbs binary representation error, e.g. 0.29 * 100 = 28.999999999999996.
const QUANTIZE_EPSILON: f64 = 1e-9;

/// How a value is brought down to the configured number of decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    /// Drop extra digits (1.009 -> 1.00)
    #[default]
    Truncate,
    /// Round half away from zero (1.005 -> 1.01)
    Round,
}

/// Fixed decimal precision used for interval bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    pub digits: u32,
    #[serde(default)]
    pub mode: RoundingMode,
}

impl Default for Precision {
    fn default() -> Self {
        Self::truncate(DEFAULT_PRECISION_DIGITS)
    }
}

impl Precision {
    /// Truncating precision with the given number of decimals
    pub fn truncate(digits: u32) -> Self {
        Self {
            digits: digits.min(MAX_PRECISION_DIGITS),
            mode: RoundingMode::Truncate,
        }
    }

    /// Rounding precision with the given number of decimals
    pub fn round(digits: u32) -> Self {
        Self {
            digits: digits.min(MAX_PRECISION_DIGITS),
            mode: RoundingMode::Round,
        }
    }

    fn factor(&self) -> f64 {
        10f64.powi(self.digits.min(MAX_PRECISION_DIGITS) as i32)
    }

    /// Quantize a value to this precision.
    ///
    /// Quantizing an already quantized value returns it unchanged.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let factor = self.factor();
        let scaled = value * factor;
        let quantized = match self.mode {
            RoundingMode::Truncate => {
                if scaled >= 0.0 {
                    (scaled + QUANTIZE_EPSILON).trunc()
                } else {
                    (scaled - QUANTIZE_EPSILON).trunc()
                }
            }
            RoundingMode::Round => scaled.round(),
        };
        quantized / factor
    }

    /// Quantize a value without letting it pass `limit`.
    ///
    /// Rounding can carry a value just under `limit` past it; such values
    /// fall back to the largest step not above `limit`.
    pub fn apply_within(&self, value: f64, limit: f64) -> f64 {
        let quantized = self.apply(value);
        if quantized <= limit {
            return quantized;
        }
        let factor = self.factor();
        ((limit * factor).floor() / factor).min(limit)
    }
}

/// A `[start, end]` time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    /// Create an interval, rejecting non-finite, negative, or reversed bounds
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(CropError::InvalidInterval {
                reason: format!("bounds must be finite (got {} - {})", start, end),
            });
        }
        if start < 0.0 {
            return Err(CropError::InvalidInterval {
                reason: format!("start must not be negative (got {})", start),
            });
        }
        if start > end {
            return Err(CropError::InvalidInterval {
                reason: format!("start {} is after end {}", start, end),
            });
        }
        Ok(Self { start, end })
    }

    /// The full range of an asset: `[0, duration]`
    pub fn full(duration: f64) -> Self {
        Self {
            start: 0.0,
            end: duration.max(0.0),
        }
    }

    /// Length of the interval in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `0 <= start <= end <= duration` holds
    pub fn fits_within(&self, duration: f64) -> bool {
        self.start >= 0.0 && self.start <= self.end && self.end <= duration
    }

    /// Clamp both bounds into `[0, duration]` and swap them if crossed.
    ///
    /// Non-finite bounds are an error; out-of-range bounds are not.
    pub fn clamped(start: f64, end: f64, duration: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(CropError::InvalidInterval {
                reason: format!("bounds must be finite (got {} - {})", start, end),
            });
        }
        let start = start.clamp(0.0, duration);
        let end = end.clamp(0.0, duration);
        Ok(if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        })
    }

    /// Quantize both bounds
    pub fn quantized(&self, precision: Precision) -> Self {
        Self {
            start: precision.apply(self.start),
            end: precision.apply(self.end),
        }
    }

    /// Quantize both bounds, keeping them inside `[0, duration]`
    pub fn quantized_within(&self, precision: Precision, duration: f64) -> Self {
        let end = precision.apply_within(self.end, duration);
        let start = precision.apply_within(self.start, duration).min(end);
        Self { start, end }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s - {:.3}s]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test_case(1.004, 1.0 ; "drops third decimal")]
    #[test_case(4.009, 4.0 ; "does not round up")]
    #[test_case(0.29, 0.29 ; "survives binary representation error")]
    #[test_case(7.3, 7.3 ; "keeps exact value")]
    #[test_case(0.0, 0.0 ; "zero")]
    fn test_truncate_two_digits(input: f64, expected: f64) {
        assert_relative_eq!(Precision::truncate(2).apply(input), expected);
    }

    #[test]
    fn test_round_mode() {
        let precision = Precision::round(2);
        assert_relative_eq!(precision.apply(4.009), 4.01);
        assert_relative_eq!(precision.apply(1.004), 1.0);
    }

    #[test]
    fn test_round_never_passes_duration() {
        let precision = Precision::round(2);
        let interval = Interval { start: 10.336, end: 10.337 }.quantized_within(precision, 10.337);
        assert_relative_eq!(interval.end, 10.33);
        assert_relative_eq!(interval.start, 10.33);
        assert!(interval.fits_within(10.337));

        // Values that round down are untouched
        assert_relative_eq!(precision.apply_within(4.004, 10.337), 4.0);
    }

    #[test]
    fn test_truncate_within_matches_truncate() {
        let precision = Precision::default();
        let interval = Interval { start: 1.004, end: 4.009 };
        assert_eq!(
            interval.quantized_within(precision, 10.0),
            interval.quantized(precision)
        );
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let precision = Precision::default();
        for i in 0..2000 {
            let value = i as f64 * 0.0137;
            let once = precision.apply(value);
            assert_eq!(precision.apply(once), once, "value {}", value);
        }
    }

    #[test]
    fn test_digits_are_capped() {
        assert_eq!(Precision::truncate(42).digits, MAX_PRECISION_DIGITS);
    }

    #[test]
    fn test_interval_new_rejects_reversed() {
        assert!(Interval::new(3.0, 1.0).is_err());
        assert!(Interval::new(-1.0, 1.0).is_err());
        assert!(Interval::new(f64::NAN, 1.0).is_err());
        assert!(Interval::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_clamped_swaps_and_bounds() {
        let interval = Interval::clamped(12.0, -3.0, 10.0).unwrap();
        assert_eq!(interval, Interval { start: 0.0, end: 10.0 });

        let interval = Interval::clamped(6.0, 2.0, 10.0).unwrap();
        assert_eq!(interval, Interval { start: 2.0, end: 6.0 });

        assert!(Interval::clamped(f64::INFINITY, 2.0, 10.0).is_err());
    }

    #[test]
    fn test_full_and_length() {
        let interval = Interval::full(8.5);
        assert_eq!(interval.start, 0.0);
        assert_relative_eq!(interval.length(), 8.5);
        assert!(interval.fits_within(8.5));
        assert!(!interval.fits_within(8.0));
    }
}
