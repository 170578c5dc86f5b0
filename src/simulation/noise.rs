use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};
use std::f32::consts::PI;

use crate::error::{Result, RhythmError};
use crate::signal_processing::math::rms;
use crate::simulation::signal::{BeatTrainConfig, SyntheticSignal, synthesize};

/// Corruption applied to a clean synthetic signal
///
/// Every component is optional. A fixed `seed` makes the result
/// reproducible.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub motion: Option<MotionArtifactConfig>,
    pub baseline_wander: Option<BaselineWanderConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_motion_artifacts(mut self, rate_hz: f32, amplitude: f32, duration_secs: f32) -> Self {
        self.motion = Some(MotionArtifactConfig {
            rate_hz,
            amplitude,
            duration_secs,
        });
        self
    }

    pub fn with_baseline_wander(mut self, amplitude: f32, frequency_hz: f32) -> Self {
        self.baseline_wander = Some(BaselineWanderConfig {
            amplitude,
            frequency_hz,
        });
        self
    }
}

/// White Gaussian noise at a signal-to-noise ratio
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f32,
}

/// Electrode or motion transients
///
/// Onsets follow a Poisson process at `rate_hz`. Each transient jumps to
/// `±amplitude` and relaxes exponentially over `duration_secs`.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MotionArtifactConfig {
    pub rate_hz: f32,
    pub amplitude: f32,
    pub duration_secs: f32,
}

/// Slow sinusoidal drift of the baseline (electrode impedance, posture)
#[derive(Clone, Debug, serde::Deserialize)]
pub struct BaselineWanderConfig {
    pub amplitude: f32,
    pub frequency_hz: f32,
}

/// Seeded source of every corruption component
struct Corruptor {
    rng: ChaCha8Rng,
    sample_rate: f32,
}

impl Corruptor {
    fn new(seed: Option<u64>, sample_rate: f32) -> Self {
        let rng = seed.map_or_else(rand::make_rng, ChaCha8Rng::seed_from_u64);
        Self { rng, sample_rate }
    }

    fn baseline_wander(&mut self, signal: &mut [f32], config: &BaselineWanderConfig) {
        let phase = self.rng.random::<f32>() * 2.0 * PI;
        let omega = 2.0 * PI * config.frequency_hz / self.sample_rate;
        for (i, sample) in signal.iter_mut().enumerate() {
            *sample += config.amplitude * (omega * i as f32 + phase).sin();
        }
    }

    fn motion_artifacts(&mut self, signal: &mut [f32], config: &MotionArtifactConfig) -> Result<()> {
        if signal.is_empty() || config.rate_hz <= 0.0 {
            return Ok(());
        }
        let gaps = Exp::new(config.rate_hz)
            .map_err(|_| RhythmError::InvalidParameter("artifact rate must be finite"))?;
        let length = ((config.duration_secs * self.sample_rate).round() as usize).max(1);
        // Decays to about 5% by the end of the transient
        let tau = length as f32 / 3.0;

        let mut onset = 0.0f32;
        loop {
            onset += gaps.sample(&mut self.rng);
            let start = (onset * self.sample_rate) as usize;
            if start >= signal.len() {
                return Ok(());
            }
            let step = if self.rng.random::<bool>() {
                config.amplitude
            } else {
                -config.amplitude
            };
            let end = (start + length).min(signal.len());
            for (k, sample) in signal[start..end].iter_mut().enumerate() {
                *sample += step * (-(k as f32) / tau).exp();
            }
        }
    }

    /// White noise scaled to the current power of `signal`
    fn additive(&mut self, signal: &mut [f32], config: &AdditiveNoiseConfig) -> Result<()> {
        let level = rms(signal);
        if level == 0.0 {
            return Ok(());
        }
        let noise_std = level / 10.0_f32.powf(config.snr_db / 20.0);
        let normal = Normal::new(0.0, noise_std)
            .map_err(|_| RhythmError::InvalidParameter("noise level must be finite"))?;
        for sample in signal.iter_mut() {
            *sample += normal.sample(&mut self.rng);
        }
        Ok(())
    }
}

/// Corrupt a copy of `clean_signal`
///
/// Wander and motion transients are added first; white noise is scaled to
/// the power of the result.
pub fn apply_noise(clean_signal: &[f32], config: &NoiseConfig, sample_rate: f32) -> Result<Vec<f32>> {
    let mut signal = clean_signal.to_vec();
    let mut corruptor = Corruptor::new(config.seed, sample_rate);

    if let Some(ref wander) = config.baseline_wander {
        corruptor.baseline_wander(&mut signal, wander);
    }
    if let Some(ref motion) = config.motion {
        corruptor.motion_artifacts(&mut signal, motion)?;
    }
    if let Some(ref additive) = config.additive {
        corruptor.additive(&mut signal, additive)?;
    }

    Ok(signal)
}

/// Synthesize an event train and corrupt it
pub fn generate_noisy_beat_train(
    train: &BeatTrainConfig,
    noise: &NoiseConfig,
) -> Result<SyntheticSignal> {
    let mut signal = synthesize(train)?;
    signal.samples = apply_noise(&signal.samples, noise, train.sample_rate)?;
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let clean = vec![1.0f32; 1000];
        let config = NoiseConfig::default().with_seed(7).with_awgn(10.0);
        let a = apply_noise(&clean, &config, 100.0).unwrap();
        let b = apply_noise(&clean, &config, 100.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, clean);
    }

    #[test]
    fn test_awgn_power() {
        let clean: Vec<f32> = (0..20000).map(|i| (i as f32 * 0.05).sin()).collect();
        let config = NoiseConfig::default().with_seed(1).with_awgn(10.0);
        let noisy = apply_noise(&clean, &config, 100.0).unwrap();

        let noise: Vec<f32> = noisy.iter().zip(&clean).map(|(n, c)| n - c).collect();
        let snr = 20.0 * (rms(&clean) / rms(&noise)).log10();
        assert!((snr - 10.0).abs() < 0.5, "snr {}", snr);
    }

    #[test]
    fn test_baseline_wander_amplitude() {
        let clean = vec![0.0f32; 4000];
        let config = NoiseConfig::default()
            .with_seed(3)
            .with_baseline_wander(0.5, 0.1);
        let wander = apply_noise(&clean, &config, 100.0).unwrap();
        let peak = wander.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(peak > 0.45 && peak <= 0.5 + 1e-4);
    }

    #[test]
    fn test_motion_artifacts_decay() {
        let clean = vec![0.0f32; 10000];
        let config = NoiseConfig::default()
            .with_seed(11)
            .with_motion_artifacts(1.0, 2.0, 0.05);
        let noisy = apply_noise(&clean, &config, 100.0).unwrap();

        let hit = noisy.iter().filter(|&&x| x != 0.0).count();
        assert!(hit > 0);
        assert!(hit < 10000 / 10);

        // Transients start at full amplitude and only decay from there
        assert!(noisy.iter().any(|&x| (x.abs() - 2.0).abs() < 1e-6));
        assert!(noisy.iter().filter(|&&x| x.abs() < 0.5 && x != 0.0).count() > 0);
    }
}
