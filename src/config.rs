//! Configuration for the pulsekit rhythm pipeline.
//!
//! Every stage is configured by a plain struct with named presets for the
//! three supported signal classes. The same detection and filtering code runs
//! for all of them; only the parameters differ.
//!
//! ## Loading from TOML
//!
//! ```
//! use pulsekit::config::{AnalyzerConfig, SignalKind};
//!
//! let config = AnalyzerConfig::from_toml_str(
//!     r#"
//!     kind = "ecg"
//!     sample_rate = 250.0
//!
//!     [intervals]
//!     min_interval = 0.25
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.kind, SignalKind::Ecg);
//! assert!((config.intervals.min_interval - 0.25).abs() < 1e-6);
//! assert!((config.detector.peak_window - 0.1).abs() < 1e-6);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, RhythmError};

/// Class of biosignal a channel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Electrocardiogram; peaks are R waves
    Ecg,
    /// Photoplethysmogram; peaks are systolic pulses
    Ppg,
    /// Respiration (belt or impedance); peaks are inhalations
    #[serde(alias = "rsp", alias = "resp")]
    Respiration,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ecg => "ecg",
            Self::Ppg => "ppg",
            Self::Respiration => "respiration",
        };
        f.write_str(name)
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecg" => Ok(Self::Ecg),
            "ppg" => Ok(Self::Ppg),
            "rsp" | "resp" | "respiration" => Ok(Self::Respiration),
            other => Err(format!("unknown signal kind: {}", other)),
        }
    }
}

/// How the peak detector emphasises the event-defining feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Absolute central-difference gradient (steep QRS slopes)
    AbsGradient,
    /// Negative samples clipped to zero, then squared (pulse and breath lobes)
    SquaredPositive,
}

/// Two-window adaptive peak detector configuration
///
/// All windows and delays are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Short "event" moving average window
    pub peak_window: f32,
    /// Long "context" moving average window
    pub baseline_window: f32,
    /// Weight of the emphasised-trace mean added to the long average
    pub prominence_weight: f32,
    /// Minimum block width as a fraction of `peak_window`
    pub min_width_weight: f32,
    /// Minimum delay between successive peaks
    pub min_peak_delay: f32,
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Feature emphasis applied before averaging
    pub emphasis: Emphasis,
}

impl DetectorConfig {
    /// R-peak detection preset
    pub fn ecg(sample_rate: f32) -> Self {
        Self {
            peak_window: 0.1,
            baseline_window: 1.0,
            prominence_weight: 1.5,
            min_width_weight: 0.4,
            min_peak_delay: 0.3,
            sample_rate,
            emphasis: Emphasis::AbsGradient,
        }
    }

    /// Systolic peak detection preset
    pub fn ppg(sample_rate: f32) -> Self {
        Self {
            peak_window: 0.111,
            baseline_window: 0.667,
            prominence_weight: 0.02,
            min_width_weight: 1.0,
            min_peak_delay: 0.3,
            sample_rate,
            emphasis: Emphasis::SquaredPositive,
        }
    }

    /// Breath detection preset
    pub fn respiration(sample_rate: f32) -> Self {
        Self {
            peak_window: 0.5,
            baseline_window: 2.0,
            prominence_weight: 0.05,
            min_width_weight: 1.0,
            min_peak_delay: 0.3,
            sample_rate,
            emphasis: Emphasis::SquaredPositive,
        }
    }

    pub fn for_kind(kind: SignalKind, sample_rate: f32) -> Self {
        match kind {
            SignalKind::Ecg => Self::ecg(sample_rate),
            SignalKind::Ppg => Self::ppg(sample_rate),
            SignalKind::Respiration => Self::respiration(sample_rate),
        }
    }

    /// Short window length in samples
    pub fn peak_window_samples(&self) -> usize {
        seconds_to_samples(self.peak_window, self.sample_rate)
    }

    /// Long window length in samples
    pub fn baseline_window_samples(&self) -> usize {
        seconds_to_samples(self.baseline_window, self.sample_rate)
    }

    /// Shortest signal the detector accepts
    pub fn min_signal_len(&self) -> usize {
        2 * self.baseline_window_samples()
    }

    /// Minimum accepted block width in samples (fractional)
    pub fn min_block_width(&self) -> f32 {
        self.min_width_weight * self.peak_window * self.sample_rate
    }

    /// Minimum peak separation in samples
    pub fn min_peak_delay_samples(&self) -> usize {
        (self.min_peak_delay * self.sample_rate).round() as usize
    }

    /// Check that every window, weight and rate is positive and finite
    pub fn validate(&self) -> Result<()> {
        positive(self.sample_rate, "sample rate must be positive")?;
        positive(self.peak_window, "peak window must be positive")?;
        positive(self.baseline_window, "baseline window must be positive")?;
        positive(self.min_peak_delay, "minimum peak delay must be positive")?;
        positive(self.min_width_weight, "minimum width weight must be positive")?;
        if !self.prominence_weight.is_finite() || self.prominence_weight < 0.0 {
            return Err(RhythmError::InvalidParameter(
                "prominence weight must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Quotient (ratio) filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuotientFilterConfig {
    /// Upper bound on filter passes
    pub iterations: usize,
    /// Lowest accepted neighbour ratio
    pub lowcut: f32,
    /// Highest accepted neighbour ratio
    pub highcut: f32,
}

impl QuotientFilterConfig {
    /// Symmetric band `[1 - delta, 1 + delta]`
    pub fn with_delta(iterations: usize, delta: f32) -> Self {
        Self {
            iterations,
            lowcut: 1.0 - delta,
            highcut: 1.0 + delta,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(RhythmError::InvalidParameter(
                "quotient filter needs at least one iteration",
            ));
        }
        positive(self.lowcut, "quotient lowcut must be positive")?;
        if !self.highcut.is_finite() || self.highcut < self.lowcut {
            return Err(RhythmError::InvalidParameter(
                "quotient highcut must not be below lowcut",
            ));
        }
        Ok(())
    }
}

impl Default for QuotientFilterConfig {
    fn default() -> Self {
        Self::with_delta(2, 0.3)
    }
}

/// Interval range and quotient filter configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalFilterConfig {
    /// Shortest plausible interval in seconds
    pub min_interval: f32,
    /// Longest plausible interval in seconds
    pub max_interval: f32,
    /// Allowed relative change between neighbouring intervals
    pub min_delta: f32,
    /// Upper bound on quotient filter passes
    pub quotient_iterations: usize,
}

impl IntervalFilterConfig {
    /// Heart-beat intervals (ECG and PPG): 30-200 bpm
    pub fn cardiac() -> Self {
        Self {
            min_interval: 0.3,
            max_interval: 2.0,
            min_delta: 0.3,
            quotient_iterations: 2,
        }
    }

    /// Breath intervals: 6-60 breaths per minute
    pub fn respiration() -> Self {
        Self {
            min_interval: 1.0,
            max_interval: 10.0,
            min_delta: 0.5,
            quotient_iterations: 2,
        }
    }

    pub fn for_kind(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Ecg | SignalKind::Ppg => Self::cardiac(),
            SignalKind::Respiration => Self::respiration(),
        }
    }

    pub fn quotient(&self) -> QuotientFilterConfig {
        QuotientFilterConfig::with_delta(self.quotient_iterations, self.min_delta)
    }
}

impl Default for IntervalFilterConfig {
    fn default() -> Self {
        Self::cardiac()
    }
}

/// Spectral (tachogram) rate estimator configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Uniform resampling rate for the tachogram in Hz
    pub resample_rate: f32,
    /// Lower edge of the search band in Hz
    pub min_freq_hz: f32,
    /// Upper edge of the search band in Hz
    pub max_freq_hz: f32,
    /// Fewest peaks accepted for an estimate
    pub min_peaks: usize,
}

impl SpectralConfig {
    pub fn validate(&self) -> Result<()> {
        positive(self.resample_rate, "resample rate must be positive")?;
        positive(self.min_freq_hz, "band lower edge must be positive")?;
        if !self.max_freq_hz.is_finite() || self.max_freq_hz <= self.min_freq_hz {
            return Err(RhythmError::InvalidParameter(
                "band upper edge must exceed lower edge",
            ));
        }
        if self.max_freq_hz > self.resample_rate / 2.0 {
            return Err(RhythmError::InvalidParameter(
                "band upper edge exceeds the resampled Nyquist frequency",
            ));
        }
        if self.min_peaks < 3 {
            return Err(RhythmError::InvalidParameter(
                "spectral estimate needs at least three peaks",
            ));
        }
        Ok(())
    }
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            resample_rate: 4.0,
            min_freq_hz: 0.1,
            max_freq_hz: 0.5,
            min_peaks: 4,
        }
    }
}

/// Quadratic mapping from perfusion ratio to saturation percentage
///
/// `saturation = c[0]·r² + c[1]·r + c[2]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CalibrationCoefficients(pub [f32; 3]);

impl CalibrationCoefficients {
    pub fn new(quadratic: f32, linear: f32, offset: f32) -> Self {
        Self([quadratic, linear, offset])
    }

    pub fn apply(&self, ratio: f32) -> f32 {
        let [a, b, c] = self.0;
        a * ratio * ratio + b * ratio + c
    }
}

impl Default for CalibrationCoefficients {
    fn default() -> Self {
        Self([1.595_842_2, -34.659_662, 112.689_876])
    }
}

/// Complete configuration of one analysed channel
///
/// Use [`AnalyzerConfig::for_kind`] for presets, or load from TOML where
/// only the fields being overridden need to be given.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Signal class of the channel
    pub kind: SignalKind,
    /// Sample rate in Hz
    pub sample_rate: f32,
    /// Peak detector configuration
    pub detector: DetectorConfig,
    /// Interval artifact filter configuration
    pub intervals: IntervalFilterConfig,
    /// ECG-derived respiration configuration (used for ECG channels)
    pub spectral: SpectralConfig,
    /// SpO2 calibration
    pub calibration: CalibrationCoefficients,
}

impl AnalyzerConfig {
    pub fn for_kind(kind: SignalKind, sample_rate: f32) -> Self {
        Self {
            kind,
            sample_rate,
            detector: DetectorConfig::for_kind(kind, sample_rate),
            intervals: IntervalFilterConfig::for_kind(kind),
            spectral: SpectralConfig::default(),
            calibration: CalibrationCoefficients::default(),
        }
    }

    /// Parse a TOML document; absent sections and fields keep the presets
    /// of the declared signal kind.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| RhythmError::Config(e.to_string()))?;
        let mut config = Self::for_kind(file.kind, file.sample_rate);
        if let Some(detector) = file.detector {
            detector.apply(&mut config.detector);
        }
        if let Some(intervals) = file.intervals {
            intervals.apply(&mut config.intervals);
        }
        if let Some(spectral) = file.spectral {
            config.spectral = spectral;
        }
        if let Some(calibration) = file.calibration {
            config.calibration = calibration;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        positive(self.sample_rate, "sample rate must be positive")?;
        if (self.detector.sample_rate - self.sample_rate).abs()
            > crate::constants::SAMPLE_RATE_TOLERANCE
        {
            return Err(RhythmError::InvalidParameter(
                "detector sample rate differs from channel sample rate",
            ));
        }
        self.detector.validate()?;
        if !(self.intervals.min_interval > 0.0
            && self.intervals.min_interval <= self.intervals.max_interval)
        {
            return Err(RhythmError::InvalidParameter(
                "interval bounds must satisfy 0 < min <= max",
            ));
        }
        self.intervals.quotient().validate()?;
        self.spectral.validate()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    kind: SignalKind,
    sample_rate: f32,
    detector: Option<DetectorSection>,
    intervals: Option<IntervalSection>,
    spectral: Option<SpectralConfig>,
    calibration: Option<CalibrationCoefficients>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetectorSection {
    peak_window: Option<f32>,
    baseline_window: Option<f32>,
    prominence_weight: Option<f32>,
    min_width_weight: Option<f32>,
    min_peak_delay: Option<f32>,
    emphasis: Option<Emphasis>,
}

impl DetectorSection {
    fn apply(self, config: &mut DetectorConfig) {
        override_with(&mut config.peak_window, self.peak_window);
        override_with(&mut config.baseline_window, self.baseline_window);
        override_with(&mut config.prominence_weight, self.prominence_weight);
        override_with(&mut config.min_width_weight, self.min_width_weight);
        override_with(&mut config.min_peak_delay, self.min_peak_delay);
        override_with(&mut config.emphasis, self.emphasis);
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IntervalSection {
    min_interval: Option<f32>,
    max_interval: Option<f32>,
    min_delta: Option<f32>,
    quotient_iterations: Option<usize>,
}

impl IntervalSection {
    fn apply(self, config: &mut IntervalFilterConfig) {
        override_with(&mut config.min_interval, self.min_interval);
        override_with(&mut config.max_interval, self.max_interval);
        override_with(&mut config.min_delta, self.min_delta);
        override_with(&mut config.quotient_iterations, self.quotient_iterations);
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn positive(value: f32, message: &'static str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RhythmError::InvalidParameter(message))
    }
}

fn seconds_to_samples(seconds: f32, sample_rate: f32) -> usize {
    ((seconds * sample_rate).round() as usize).max(1)
}
