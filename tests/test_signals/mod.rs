#![allow(dead_code)]

use pulsekit::config::{DetectorConfig, SignalKind};
use pulsekit::constants::STANDARDIZE_EPSILON;
use pulsekit::signal::Signal;
use pulsekit::signal_processing::{DetectorWorkspace, PeakDetector, PeakSet, standardize_into};

/// Unit impulses at `first + k · period_secs` seconds
pub fn impulse_train(
    sample_rate: f32,
    duration_secs: f32,
    first_secs: f32,
    period_secs: f32,
) -> (Vec<f32>, Vec<usize>) {
    let len = (duration_secs * sample_rate) as usize;
    let mut samples = vec![0.0; len];
    let positions: Vec<usize> = (0..)
        .map(|k| ((first_secs + k as f32 * period_secs) * sample_rate).round() as usize)
        .take_while(|&i| i < len)
        .collect();
    for &i in &positions {
        samples[i] = 1.0;
    }
    (samples, positions)
}

/// Standardize and run the preset detector for `kind`
pub fn detect(kind: SignalKind, samples: &[f32], sample_rate: f32) -> PeakSet {
    let mut standardized = vec![0.0; samples.len()];
    standardize_into(samples, &mut standardized, STANDARDIZE_EPSILON).unwrap();
    let signal = Signal::new(&standardized, sample_rate).unwrap();
    let detector = PeakDetector::new(DetectorConfig::for_kind(kind, sample_rate)).unwrap();
    let mut workspace = DetectorWorkspace::for_signal(&signal);
    detector.find_peaks(&signal, &mut workspace).unwrap()
}

/// Largest distance from a found peak to its nearest true event
pub fn max_peak_error(found: &[usize], truth: &[usize]) -> usize {
    found
        .iter()
        .map(|&p| truth.iter().map(|&t| p.abs_diff(t)).min().unwrap_or(usize::MAX))
        .max()
        .unwrap_or(0)
}
