use std::f32::consts::PI;

use crate::constants::STANDARDIZE_EPSILON;
use crate::error::{Result, RhythmError};
use crate::rhythm::Perfusion;
use crate::signal_processing::standardize_into;

/// Relative amplitude of the T wave following each QRS complex
pub const T_WAVE_AMPLITUDE: f32 = 0.3;
/// Delay of the T wave after the R peak, in seconds
pub const T_WAVE_DELAY_SECS: f32 = 0.25;

/// Waveform drawn at every event of a synthetic train
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseShape {
    /// Narrow R spike with a broad, low T wave
    Qrs,
    /// Smooth systolic pulse
    Pulse,
    /// Slow inhalation lobe
    Breath,
}

impl PulseShape {
    /// Gaussian components as (delay s, amplitude, width s)
    fn components(self) -> &'static [(f32, f32, f32)] {
        match self {
            Self::Qrs => &[(0.0, 1.0, 0.01), (T_WAVE_DELAY_SECS, T_WAVE_AMPLITUDE, 0.04)],
            Self::Pulse => &[(0.0, 1.0, 0.1)],
            Self::Breath => &[(0.0, 1.0, 0.6)],
        }
    }
}

/// Event train with sinusoidal interval modulation
///
/// Each interval is `mean_interval + modulation_depth · sin(2π · modulation_hz · t)`
/// where `t` is the time of the event that starts it, which models
/// respiratory sinus arrhythmia on a heart-beat train.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BeatTrainConfig {
    pub sample_rate: f32,
    pub duration_secs: f32,
    /// Mean event interval in seconds
    pub mean_interval: f32,
    /// Peak interval deviation in seconds
    #[serde(default)]
    pub modulation_depth: f32,
    /// Modulation frequency in Hz
    #[serde(default)]
    pub modulation_hz: f32,
    /// Time of the first event in seconds
    #[serde(default = "default_first_event")]
    pub first_event: f32,
    pub shape: PulseShape,
}

fn default_first_event() -> f32 {
    0.5
}

impl BeatTrainConfig {
    /// Heart beats at `bpm` with no modulation
    pub fn ecg(sample_rate: f32, duration_secs: f32, bpm: f32) -> Self {
        Self {
            sample_rate,
            duration_secs,
            mean_interval: 60.0 / bpm,
            modulation_depth: 0.0,
            modulation_hz: 0.0,
            first_event: default_first_event(),
            shape: PulseShape::Qrs,
        }
    }

    /// Systolic pulses at `bpm` with no modulation
    pub fn ppg(sample_rate: f32, duration_secs: f32, bpm: f32) -> Self {
        Self {
            shape: PulseShape::Pulse,
            ..Self::ecg(sample_rate, duration_secs, bpm)
        }
    }

    /// Breaths at `breaths_per_minute`
    pub fn respiration(sample_rate: f32, duration_secs: f32, breaths_per_minute: f32) -> Self {
        Self {
            shape: PulseShape::Breath,
            ..Self::ecg(sample_rate, duration_secs, breaths_per_minute)
        }
    }

    /// Add respiratory sinus arrhythmia of `depth` seconds at `breaths_per_minute`
    pub fn with_sinus_arrhythmia(mut self, depth: f32, breaths_per_minute: f32) -> Self {
        self.modulation_depth = depth;
        self.modulation_hz = breaths_per_minute / 60.0;
        self
    }

    pub fn num_samples(&self) -> usize {
        (self.duration_secs * self.sample_rate) as usize
    }

    fn validate(&self) -> Result<()> {
        if !(self.sample_rate > 0.0 && self.duration_secs > 0.0 && self.first_event >= 0.0) {
            return Err(RhythmError::InvalidParameter(
                "sample rate, duration and first event must be positive",
            ));
        }
        if self.mean_interval - self.modulation_depth.abs() <= 0.0 {
            return Err(RhythmError::InvalidParameter(
                "modulated interval must stay positive",
            ));
        }
        Ok(())
    }
}

/// Synthetic samples with the ground-truth event positions
#[derive(Debug, Clone)]
pub struct SyntheticSignal {
    pub samples: Vec<f32>,
    /// Sample index of every event inside the signal
    pub beat_indices: Vec<usize>,
    pub sample_rate: f32,
}

impl SyntheticSignal {
    /// Ground-truth intervals in samples
    pub fn intervals(&self) -> Vec<u32> {
        self.beat_indices
            .windows(2)
            .map(|w| (w[1] - w[0]) as u32)
            .collect()
    }
}

/// Event times in seconds
pub fn beat_times(config: &BeatTrainConfig) -> Result<Vec<f32>> {
    config.validate()?;
    let mut times = Vec::new();
    let mut t = config.first_event;
    while t < config.duration_secs {
        times.push(t);
        t += config.mean_interval
            + config.modulation_depth * (2.0 * PI * config.modulation_hz * t).sin();
    }
    Ok(times)
}

/// Render an event train
pub fn synthesize(config: &BeatTrainConfig) -> Result<SyntheticSignal> {
    let times = beat_times(config)?;
    let fs = config.sample_rate;
    let n = config.num_samples();
    let mut samples = vec![0.0f32; n];

    for &t in &times {
        for &(delay, amplitude, width) in config.shape.components() {
            add_gaussian(&mut samples, (t + delay) * fs, width * fs, amplitude);
        }
    }

    let beat_indices = times
        .iter()
        .map(|&t| (t * fs).round() as usize)
        .filter(|&i| i < n)
        .collect();

    Ok(SyntheticSignal {
        samples,
        beat_indices,
        sample_rate: fs,
    })
}

/// Two optical channels sharing one pulse train
///
/// Each channel is `dc + ac · p` where `p` is the pulse train standardized to
/// zero mean and unit deviation, so its block mean is `dc` and its block
/// standard deviation is `ac`.
pub fn ppg_pair(
    config: &BeatTrainConfig,
    first: Perfusion,
    second: Perfusion,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let pulses = synthesize(config)?;
    let mut unit = vec![0.0; pulses.samples.len()];
    standardize_into(&pulses.samples, &mut unit, STANDARDIZE_EPSILON)?;

    let channel = |p: Perfusion| -> Vec<f32> { unit.iter().map(|&x| p.dc + p.ac * x).collect() };
    Ok((channel(first), channel(second)))
}

fn add_gaussian(samples: &mut [f32], center: f32, width: f32, amplitude: f32) {
    let n = samples.len();
    let lo = (center - 4.0 * width).max(0.0) as usize;
    let hi = ((center + 4.0 * width) as usize + 1).min(n);
    for (i, sample) in samples.iter_mut().enumerate().take(hi).skip(lo) {
        let z = (i as f32 - center) / width;
        *sample += amplitude * (-0.5 * z * z).exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmodulated_beat_times() {
        let config = BeatTrainConfig::ecg(250.0, 10.0, 60.0);
        let times = beat_times(&config).unwrap();
        assert_eq!(times.len(), 10);
        assert!((times[3] - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_synthesize_places_peaks_on_beats() {
        let config = BeatTrainConfig::ecg(250.0, 10.0, 75.0).with_sinus_arrhythmia(0.05, 15.0);
        let signal = synthesize(&config).unwrap();

        assert_eq!(signal.samples.len(), 2500);
        for &i in &signal.beat_indices {
            assert!(signal.samples[i] > 0.95, "R peak at {}", i);
        }
        assert_eq!(signal.intervals().len(), signal.beat_indices.len() - 1);
    }

    #[test]
    fn test_invalid_modulation_rejected() {
        let config = BeatTrainConfig::ecg(250.0, 10.0, 75.0).with_sinus_arrhythmia(1.0, 15.0);
        assert!(beat_times(&config).is_err());
    }

    #[test]
    fn test_ppg_pair_levels() {
        let config = BeatTrainConfig::ppg(100.0, 20.0, 70.0);
        let (red, infrared) =
            ppg_pair(&config, Perfusion::new(0.5, 100.0), Perfusion::new(2.0, 200.0)).unwrap();

        let red_stats = crate::signal_processing::block_stats(&red);
        let ir_stats = crate::signal_processing::block_stats(&infrared);
        assert!((red_stats.mean - 100.0).abs() < 1e-2);
        assert!((red_stats.std_dev - 0.5).abs() < 1e-2);
        assert!((ir_stats.mean - 200.0).abs() < 1e-2);
        assert!((ir_stats.std_dev - 2.0).abs() < 1e-2);
    }
}
