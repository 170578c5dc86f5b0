use std::fmt;

use crate::constants::SECONDS_PER_MINUTE;
use crate::error::{Result, RhythmError, check_len};

/// How a rate was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMethod {
    /// Mean of the valid intervals
    Direct,
    /// Dominant frequency of the resampled tachogram
    Spectral,
}

/// A rate in events per minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEstimate {
    /// Events (beats or breaths) per minute
    pub per_minute: f32,
    pub method: RateMethod,
    /// Number of intervals the estimate rests on
    pub contributing: usize,
}

impl RateEstimate {
    /// Events per second
    pub fn hz(&self) -> f32 {
        self.per_minute / SECONDS_PER_MINUTE
    }
}

impl fmt::Display for RateEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/min", self.per_minute)
    }
}

/// Rate from the mean of the unmasked intervals
///
/// `rate = sample_rate · 60 / mean(valid intervals)`. A series with no
/// valid interval fails with `InsufficientValidData`.
///
/// # Arguments
/// * `intervals` - Interval series in samples
/// * `mask` - Exclusion flags parallel to `intervals`
/// * `sample_rate` - Sample rate the intervals were measured at, in Hz
pub fn compute_rate(intervals: &[u32], mask: &[bool], sample_rate: f32) -> Result<RateEstimate> {
    check_len(intervals.len(), mask.len())?;
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(RhythmError::InvalidParameter("sample rate must be positive"));
    }

    let mut total = 0u64;
    let mut count = 0usize;
    for (&interval, &masked) in intervals.iter().zip(mask) {
        if !masked {
            total += u64::from(interval);
            count += 1;
        }
    }

    if count == 0 {
        return Err(RhythmError::InsufficientValidData);
    }
    if total == 0 {
        return Err(RhythmError::DivisionByZero("mean interval is zero"));
    }

    let mean = total as f32 / count as f32;
    let per_minute = sample_rate * SECONDS_PER_MINUTE / mean;
    log::debug!(
        "Direct rate {:.2}/min from {} of {} intervals",
        per_minute,
        count,
        intervals.len()
    );

    Ok(RateEstimate {
        per_minute,
        method: RateMethod::Direct,
        contributing: count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_intervals() {
        let intervals = [100; 8];
        let mask = [false; 8];
        let rate = compute_rate(&intervals, &mask, 100.0).unwrap();
        assert_eq!(rate.per_minute, 60.0);
        assert_eq!(rate.method, RateMethod::Direct);
        assert_eq!(rate.contributing, 8);
        assert_eq!(rate.hz(), 1.0);
    }

    #[test]
    fn test_masked_intervals_ignored() {
        let intervals = [50, 400, 50, 50];
        let mask = [false, true, false, false];
        let rate = compute_rate(&intervals, &mask, 100.0).unwrap();
        assert_eq!(rate.per_minute, 120.0);
        assert_eq!(rate.contributing, 3);
    }

    #[test]
    fn test_all_masked_fails() {
        let err = compute_rate(&[100, 100], &[true, true], 100.0).unwrap_err();
        assert_eq!(err, RhythmError::InsufficientValidData);

        let err = compute_rate(&[], &[], 100.0).unwrap_err();
        assert_eq!(err, RhythmError::InsufficientValidData);
    }

    #[test]
    fn test_zero_intervals_fail() {
        let err = compute_rate(&[0, 0], &[false, false], 100.0).unwrap_err();
        assert!(matches!(err, RhythmError::DivisionByZero(_)));
    }

    #[test]
    fn test_mask_length_mismatch() {
        let err = compute_rate(&[100, 100], &[false], 100.0).unwrap_err();
        assert_eq!(
            err,
            RhythmError::InvalidBuffer {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_display() {
        let rate = RateEstimate {
            per_minute: 72.04,
            method: RateMethod::Direct,
            contributing: 10,
        };
        assert_eq!(rate.to_string(), "72.0/min");
    }
}
