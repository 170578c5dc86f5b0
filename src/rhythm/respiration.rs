//! ECG-derived respiration
//!
//! Breathing modulates the heart's beat-to-beat timing (respiratory sinus
//! arrhythmia). The interval series, stamped with the time of the beat that
//! ends each interval, is an irregularly sampled trace of that modulation.
//! Resampling it onto a uniform grid and locating the dominant frequency in
//! the breathing band gives the respiratory rate.

use crate::config::SpectralConfig;
use crate::constants::{SECONDS_PER_MINUTE, SPECTRAL_FLOOR};
use crate::error::{Result, RhythmError, check_increasing, check_len};
use crate::rhythm::rate::{RateEstimate, RateMethod};
use crate::signal_processing::interpolation::interp1d;
use crate::signal_processing::math::mean;
use crate::signal_processing::spectral::{
    SpectrumAnalyzer, blackman_window_into, frequency_bins_into,
};

/// Irregularly sampled interval series
///
/// Each unmasked interval, in seconds, paired with the time in seconds of
/// the later peak of its pair.
#[derive(Debug, Clone, Default)]
pub struct Tachogram {
    times: Vec<f32>,
    intervals: Vec<f32>,
}

impl Tachogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from peaks and their intervals, skipping masked intervals
    ///
    /// Returns the number of points kept. On error the tachogram is left
    /// unchanged.
    pub fn rebuild(
        &mut self,
        peaks: &[usize],
        intervals: &[u32],
        mask: Option<&[bool]>,
        sample_rate: f32,
    ) -> Result<usize> {
        check_len(peaks.len().saturating_sub(1), intervals.len())?;
        if let Some(mask) = mask {
            check_len(intervals.len(), mask.len())?;
        }

        self.times.clear();
        self.intervals.clear();
        for (i, &interval) in intervals.iter().enumerate() {
            if mask.is_some_and(|m| m[i]) {
                continue;
            }
            self.times.push(peaks[i + 1] as f32 / sample_rate);
            self.intervals.push(interval as f32 / sample_rate);
        }
        Ok(self.times.len())
    }

    /// Peak times in seconds
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Intervals in seconds
    pub fn intervals(&self) -> &[f32] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Spectral rate estimator over a peak train
///
/// Owns the FFT plan and every intermediate buffer, so after the first call
/// of a given size estimation does not allocate. One estimator per channel.
#[derive(Debug)]
pub struct SpectralRateEstimator {
    config: SpectralConfig,
    tachogram: Tachogram,
    analyzer: SpectrumAnalyzer,
    grid: Vec<f32>,
    resampled: Vec<f32>,
    window: Vec<f32>,
    magnitudes: Vec<f32>,
    bins: Vec<f32>,
}

impl SpectralRateEstimator {
    pub fn new(config: SpectralConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tachogram: Tachogram::new(),
            analyzer: SpectrumAnalyzer::new(),
            grid: Vec::new(),
            resampled: Vec::new(),
            window: Vec::new(),
            magnitudes: Vec::new(),
            bins: Vec::new(),
        })
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Tachogram of the last call
    pub fn tachogram(&self) -> &Tachogram {
        &self.tachogram
    }

    /// Estimate the modulating rate in events per minute
    ///
    /// # Arguments
    /// * `peaks` - Strictly increasing peak indices
    /// * `intervals` - Intervals between those peaks, one fewer than `peaks`
    /// * `mask` - Optional artifact flags; masked intervals are left out
    /// * `sample_rate` - Sample rate of the peak indices in Hz
    pub fn estimate(
        &mut self,
        peaks: &[usize],
        intervals: &[u32],
        mask: Option<&[bool]>,
        sample_rate: f32,
    ) -> Result<RateEstimate> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(RhythmError::InvalidParameter("sample rate must be positive"));
        }
        if peaks.len() < self.config.min_peaks {
            return Err(RhythmError::InsufficientData {
                needed: self.config.min_peaks,
                available: peaks.len(),
            });
        }

        check_increasing(peaks)?;

        let points = self.tachogram.rebuild(peaks, intervals, mask, sample_rate)?;
        self.resample()?;

        // Detrend and taper
        let offset = mean(&self.resampled);
        self.window.resize(self.resampled.len(), 0.0);
        blackman_window_into(&mut self.window);
        for (value, &w) in self.resampled.iter_mut().zip(&self.window) {
            *value = (*value - offset) * w;
        }

        let resample_rate = self.config.resample_rate;
        let fft_len = self
            .analyzer
            .magnitude_spectrum(&self.resampled, &mut self.magnitudes)?;
        self.bins.resize(self.magnitudes.len(), 0.0);
        frequency_bins_into(&mut self.bins, resample_rate, fft_len)?;

        let (low, high) = (self.config.min_freq_hz, self.config.max_freq_hz);
        let mut best: Option<(f32, f32)> = None;
        for (&freq, &magnitude) in self.bins.iter().zip(&self.magnitudes) {
            if freq < low || freq > high {
                continue;
            }
            if best.is_none_or(|(_, top)| magnitude > top) {
                best = Some((freq, magnitude));
            }
        }

        let (freq, magnitude) = match best {
            Some(found) if found.1 >= SPECTRAL_FLOOR => found,
            _ => {
                log::debug!(
                    "No dominant frequency in {:.2}-{:.2} Hz over {} resampled points",
                    low,
                    high,
                    self.resampled.len()
                );
                return Err(RhythmError::NoDominantFrequency {
                    low_hz: low,
                    high_hz: high,
                });
            }
        };

        let per_minute = freq * SECONDS_PER_MINUTE;
        log::debug!(
            "Spectral rate {:.2}/min: {:.3} Hz (magnitude {:.4}, {} point FFT of {} samples)",
            per_minute,
            freq,
            magnitude,
            fft_len,
            self.resampled.len()
        );

        Ok(RateEstimate {
            per_minute,
            method: RateMethod::Spectral,
            contributing: points,
        })
    }

    /// Interpolate the tachogram onto a uniform grid at the resample rate
    fn resample(&mut self) -> Result<()> {
        let times = self.tachogram.times();
        let (start, end) = match (times.first(), times.last()) {
            (Some(&start), Some(&end)) => (start, end),
            _ => (0.0, 0.0),
        };
        let step = 1.0 / self.config.resample_rate;
        let count = ((end - start) * self.config.resample_rate).floor() as usize + 1;

        self.grid.clear();
        self.grid.extend((0..count).map(|k| start + k as f32 * step));
        self.resampled.resize(count, 0.0);
        interp1d(
            self.tachogram.times(),
            self.tachogram.intervals(),
            &self.grid,
            &mut self.resampled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Beat positions with intervals `mean_rr + depth·sin(2π·f·t)`
    fn modulated_peaks(sample_rate: f32, secs: f32, mean_rr: f32, depth: f32, freq: f32) -> Vec<usize> {
        let mut peaks = Vec::new();
        let mut t = 0.5;
        while t < secs {
            peaks.push((t * sample_rate).round() as usize);
            t += mean_rr + depth * (2.0 * PI * freq * t).sin();
        }
        peaks
    }

    fn intervals_of(peaks: &[usize]) -> Vec<u32> {
        peaks.windows(2).map(|w| (w[1] - w[0]) as u32).collect()
    }

    #[test]
    fn test_tachogram_skips_masked() {
        let peaks = [0, 100, 210, 300];
        let intervals = [100, 110, 90];
        let mut tachogram = Tachogram::new();
        let kept = tachogram
            .rebuild(&peaks, &intervals, Some(&[false, true, false][..]), 100.0)
            .unwrap();

        assert_eq!(kept, 2);
        assert_eq!(tachogram.times(), &[1.0, 3.0]);
        assert_eq!(tachogram.intervals(), &[1.0, 0.9]);
    }

    #[test]
    fn test_respiratory_sinus_arrhythmia() {
        let sample_rate = 250.0;
        let peaks = modulated_peaks(sample_rate, 60.0, 0.8, 0.05, 0.25);
        let intervals = intervals_of(&peaks);

        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let rate = estimator.estimate(&peaks, &intervals, None, sample_rate).unwrap();

        assert!((rate.per_minute - 15.0).abs() <= 1.0, "rate {}", rate.per_minute);
        assert_eq!(rate.method, RateMethod::Spectral);
        assert_eq!(rate.contributing, intervals.len());
    }

    #[test]
    fn test_masked_intervals_left_out() {
        let sample_rate = 250.0;
        let peaks = modulated_peaks(sample_rate, 60.0, 0.8, 0.05, 0.25);
        let intervals = intervals_of(&peaks);
        let mut mask = vec![false; intervals.len()];
        mask[10] = true;
        mask[30] = true;

        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let rate = estimator
            .estimate(&peaks, &intervals, Some(mask.as_slice()), sample_rate)
            .unwrap();

        assert!((rate.per_minute - 15.0).abs() <= 1.0, "rate {}", rate.per_minute);
        assert_eq!(rate.contributing, intervals.len() - 2);
    }

    #[test]
    fn test_constant_intervals_have_no_dominant_frequency() {
        let peaks: Vec<usize> = (0..60).map(|i| 50 + i * 200).collect();
        let intervals = intervals_of(&peaks);

        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let err = estimator.estimate(&peaks, &intervals, None, 250.0).unwrap_err();
        assert!(matches!(err, RhythmError::NoDominantFrequency { .. }));
    }

    #[test]
    fn test_too_few_peaks() {
        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let err = estimator.estimate(&[0, 200, 400], &[200, 200], None, 250.0).unwrap_err();
        assert_eq!(
            err,
            RhythmError::InsufficientData {
                needed: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_interval_count_mismatch() {
        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let err = estimator
            .estimate(&[0, 200, 400, 600], &[200, 200], None, 250.0)
            .unwrap_err();
        assert!(matches!(err, RhythmError::InvalidBuffer { .. }));
    }

    #[test]
    fn test_unordered_peaks_rejected() {
        let peaks = [0, 200, 150, 600, 800];
        let intervals = [200, 50, 450, 200];

        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let err = estimator.estimate(&peaks, &intervals, None, 250.0).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidParameter(_)));
        assert!(estimator.tachogram().is_empty());
    }

    #[test]
    fn test_interpolation_error_propagates() {
        // Everything but one interval masked leaves a single tachogram point
        let peaks = [0, 200, 400, 600, 800];
        let intervals = [200, 200, 200, 200];
        let mask = [true, true, false, true];

        let mut estimator = SpectralRateEstimator::new(SpectralConfig::default()).unwrap();
        let err = estimator
            .estimate(&peaks, &intervals, Some(&mask[..]), 250.0)
            .unwrap_err();
        assert_eq!(
            err,
            RhythmError::InsufficientData {
                needed: 2,
                available: 1
            }
        );
    }
}
