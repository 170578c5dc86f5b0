use crate::config::{DetectorConfig, Emphasis};
use crate::constants::SAMPLE_RATE_TOLERANCE;
use crate::error::{Result, RhythmError, check_increasing, check_len};
use crate::signal::Signal;
use crate::signal_processing::math::{gradient_into, mean};
use crate::signal_processing::moving_average::boxcar_average_into;

/// Ordered, strictly increasing sample indices of detected events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakSet(Vec<usize>);

impl PeakSet {
    /// Wrap peak indices, rejecting any sequence that is not strictly increasing
    pub fn new(indices: Vec<usize>) -> Result<Self> {
        check_increasing(&indices)?;
        Ok(Self(indices))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl AsRef<[usize]> for PeakSet {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

/// Scratch buffers for one channel of peak detection
///
/// Holds the emphasised trace, the short and long moving averages and the
/// adaptive threshold, each exactly as long as the signal it serves.
/// Allocate once per channel and reuse it for every block of that length.
#[derive(Debug, Clone)]
pub struct DetectorWorkspace {
    emphasized: Vec<f32>,
    short_average: Vec<f32>,
    long_average: Vec<f32>,
    threshold: Vec<f32>,
}

impl DetectorWorkspace {
    /// Allocate a workspace for signals of `len` samples
    pub fn new(len: usize) -> Self {
        Self {
            emphasized: vec![0.0; len],
            short_average: vec![0.0; len],
            long_average: vec![0.0; len],
            threshold: vec![0.0; len],
        }
    }

    /// Allocate a workspace sized to `signal`
    pub fn for_signal(signal: &Signal) -> Self {
        Self::new(signal.len())
    }

    /// Build a workspace from caller-provided buffers of equal length
    pub fn from_buffers(
        emphasized: Vec<f32>,
        short_average: Vec<f32>,
        long_average: Vec<f32>,
        threshold: Vec<f32>,
    ) -> Result<Self> {
        let len = emphasized.len();
        check_len(len, short_average.len())?;
        check_len(len, long_average.len())?;
        check_len(len, threshold.len())?;
        Ok(Self {
            emphasized,
            short_average,
            long_average,
            threshold,
        })
    }

    pub fn len(&self) -> usize {
        self.emphasized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emphasized.is_empty()
    }

    /// Emphasised (rectified, squared or gradient) trace of the last call
    pub fn emphasized(&self) -> &[f32] {
        &self.emphasized
    }

    /// Short "event" moving average of the last call
    pub fn short_average(&self) -> &[f32] {
        &self.short_average
    }

    /// Long "context" moving average of the last call
    pub fn long_average(&self) -> &[f32] {
        &self.long_average
    }

    /// Adaptive decision threshold of the last call
    pub fn threshold(&self) -> &[f32] {
        &self.threshold
    }

    fn is_active(&self, i: usize) -> bool {
        self.short_average[i] > self.threshold[i]
    }
}

/// Two-window adaptive peak detector
///
/// Emphasises the event feature, compares a short moving average against a
/// long one raised by a prominence offset, and takes the signal maximum of
/// every sufficiently wide block where the short average wins. The same
/// detector serves ECG, PPG and respiration through [`DetectorConfig`]
/// presets.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    config: DetectorConfig,
}

impl PeakDetector {
    /// Create a detector, validating the configuration
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Find all peaks in a signal block
    ///
    /// Allocates the returned peak set; use [`PeakDetector::find_peaks_into`]
    /// on the hot path.
    pub fn find_peaks(&self, signal: &Signal, workspace: &mut DetectorWorkspace) -> Result<PeakSet> {
        let mut peaks = Vec::new();
        self.find_peaks_into(signal, workspace, &mut peaks, None)?;
        Ok(PeakSet(peaks))
    }

    /// Find all peaks, writing into caller-owned outputs
    ///
    /// Returns the number of peaks. On success `peaks` holds the ascending
    /// peak indices and, when given, `regions` marks the samples of each
    /// retained peak's block. On failure neither output is touched.
    ///
    /// # Arguments
    /// * `signal` - Conditioned signal at the configured sample rate
    /// * `workspace` - Scratch buffers exactly as long as the signal
    /// * `peaks` - Output peak indices (cleared first)
    /// * `regions` - Optional event mask, same length as the signal
    pub fn find_peaks_into(
        &self,
        signal: &Signal,
        workspace: &mut DetectorWorkspace,
        peaks: &mut Vec<usize>,
        regions: Option<&mut [bool]>,
    ) -> Result<usize> {
        let config = &self.config;
        if (signal.sample_rate() - config.sample_rate).abs() > SAMPLE_RATE_TOLERANCE {
            return Err(RhythmError::InvalidParameter(
                "signal sample rate differs from detector configuration",
            ));
        }

        let n = signal.len();
        let long_window = config.baseline_window_samples();
        if n < config.min_signal_len() {
            return Err(RhythmError::InsufficientData {
                needed: config.min_signal_len(),
                available: n,
            });
        }
        check_len(n, workspace.len())?;
        if let Some(regions) = regions.as_deref() {
            check_len(n, regions.len())?;
        }

        let samples = signal.samples();
        self.emphasize(samples, &mut workspace.emphasized)?;
        boxcar_average_into(
            &workspace.emphasized,
            &mut workspace.short_average,
            config.peak_window_samples(),
        )?;
        boxcar_average_into(
            &workspace.emphasized,
            &mut workspace.long_average,
            long_window,
        )?;

        let offset = config.prominence_weight * mean(&workspace.emphasized);
        for (threshold, &long) in workspace.threshold.iter_mut().zip(&workspace.long_average) {
            *threshold = long + offset;
        }

        let min_width = config.min_block_width();
        let min_delay = config.min_peak_delay_samples();
        let mut blocks = 0usize;
        let mut narrow = 0usize;

        peaks.clear();
        let mut block_start: Option<usize> = None;
        for i in 0..=n {
            let active = i < n && workspace.is_active(i);
            match (block_start, active) {
                (None, true) => block_start = Some(i),
                (Some(start), false) => {
                    block_start = None;
                    blocks += 1;

                    if ((i - start) as f32) < min_width {
                        narrow += 1;
                        log::trace!("Rejected block {}..{}: narrower than {:.1}", start, i, min_width);
                        continue;
                    }

                    let peak = argmax(samples, start, i);
                    retain_with_delay(peaks, samples, peak, min_delay);
                }
                _ => {}
            }
        }

        if let Some(regions) = regions {
            regions.fill(false);
            for &peak in peaks.iter() {
                mark_region(workspace, regions, peak);
            }
        }

        log::debug!(
            "Peak detection: {} blocks, {} too narrow, {} peaks in {} samples",
            blocks,
            narrow,
            peaks.len(),
            n
        );

        Ok(peaks.len())
    }

    fn emphasize(&self, samples: &[f32], out: &mut [f32]) -> Result<()> {
        match self.config.emphasis {
            Emphasis::AbsGradient => {
                gradient_into(samples, out)?;
                for value in out.iter_mut() {
                    *value = value.abs();
                }
            }
            Emphasis::SquaredPositive => {
                check_len(samples.len(), out.len())?;
                for (value, &x) in out.iter_mut().zip(samples) {
                    let clipped = x.max(0.0);
                    *value = clipped * clipped;
                }
            }
        }
        Ok(())
    }
}

/// Index of the maximum of `samples[start..end]`, first on ties
fn argmax(samples: &[f32], start: usize, end: usize) -> usize {
    let mut best = start;
    for i in start + 1..end {
        if samples[i] > samples[best] {
            best = i;
        }
    }
    best
}

/// Append `candidate`, or let it replace the previous peak when the two are
/// closer than `min_delay` and the candidate is larger.
fn retain_with_delay(peaks: &mut Vec<usize>, samples: &[f32], candidate: usize, min_delay: usize) {
    match peaks.last_mut() {
        Some(last) if candidate - *last < min_delay => {
            if samples[candidate] > samples[*last] {
                log::trace!("Peak {} replaces weaker peak {}", candidate, *last);
                *last = candidate;
            } else {
                log::trace!("Peak {} dropped, within delay of {}", candidate, *last);
            }
        }
        _ => peaks.push(candidate),
    }
}

/// Mark the contiguous active run containing `peak`
fn mark_region(workspace: &DetectorWorkspace, regions: &mut [bool], peak: usize) {
    let mut start = peak;
    while start > 0 && workspace.is_active(start - 1) {
        start -= 1;
    }
    let mut end = peak + 1;
    while end < regions.len() && workspace.is_active(end) {
        end += 1;
    }
    regions[start..end].fill(true);
}
