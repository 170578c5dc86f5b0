use crate::config::{AnalyzerConfig, SignalKind};
use crate::constants::STANDARDIZE_EPSILON;
use crate::error::{Result, RhythmError, check_len};
use crate::rhythm::{
    IntervalFilterReport, IntervalSeries, RateEstimate, SpectralRateEstimator, ValidityMask,
    compute_intervals_into, compute_rate, filter_intervals,
};
use crate::signal::Signal;
use crate::signal_processing::{DetectorWorkspace, PeakDetector, PeakSet, standardize_into};

/// Everything extracted from one block of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub peaks: PeakSet,
    pub intervals: IntervalSeries,
    pub mask: ValidityMask,
    pub filter: IntervalFilterReport,
    /// Direct rate, when any interval survived filtering
    pub rate: Option<RateEstimate>,
    /// ECG-derived respiratory rate (ECG channels only)
    pub respiratory_rate: Option<RateEstimate>,
}

/// Per-channel rhythm pipeline over fixed-length blocks
///
/// Standardizes each block, detects peaks, derives and filters intervals,
/// then estimates the direct rate and, for ECG, the respiratory rate from
/// heart-rate modulation. Detector scratch and block buffers are allocated
/// up front for the configured block length; each report owns a copy of the
/// block's peaks, intervals and mask, so it outlives the next call.
#[derive(Debug)]
pub struct ChannelAnalyzer {
    config: AnalyzerConfig,
    block_len: usize,
    detector: PeakDetector,
    workspace: DetectorWorkspace,
    respiration: Option<SpectralRateEstimator>,
    standardized: Vec<f32>,
    regions: Vec<bool>,
    peaks: Vec<usize>,
    intervals: Vec<u32>,
    mask: Vec<bool>,
}

impl ChannelAnalyzer {
    pub fn new(config: AnalyzerConfig, block_len: usize) -> Result<Self> {
        config.validate()?;
        if block_len == 0 {
            return Err(RhythmError::InvalidParameter("block length must be positive"));
        }

        let needed = config.detector.min_signal_len();
        if block_len < needed {
            return Err(RhythmError::InsufficientData {
                needed,
                available: block_len,
            });
        }

        let detector = PeakDetector::new(config.detector.clone())?;
        let respiration = match config.kind {
            SignalKind::Ecg => Some(SpectralRateEstimator::new(config.spectral.clone())?),
            SignalKind::Ppg | SignalKind::Respiration => None,
        };

        log::debug!(
            "{} analyzer: {} samples per block at {} Hz",
            config.kind,
            block_len,
            config.sample_rate
        );

        Ok(Self {
            block_len,
            detector,
            workspace: DetectorWorkspace::new(block_len),
            respiration,
            standardized: vec![0.0; block_len],
            regions: vec![false; block_len],
            peaks: Vec::new(),
            intervals: Vec::new(),
            mask: Vec::new(),
            config,
        })
    }

    /// Analyze one block of raw, conditioned samples
    pub fn analyze(&mut self, block: &[f32]) -> Result<ChannelReport> {
        check_len(self.block_len, block.len())?;
        let sample_rate = self.config.sample_rate;

        standardize_into(block, &mut self.standardized, STANDARDIZE_EPSILON)?;
        let signal = Signal::new(&self.standardized, sample_rate)?;
        self.detector.find_peaks_into(
            &signal,
            &mut self.workspace,
            &mut self.peaks,
            Some(self.regions.as_mut_slice()),
        )?;

        compute_intervals_into(&self.peaks, &mut self.intervals)?;
        self.mask.clear();
        self.mask.resize(self.intervals.len(), false);
        let filter = filter_intervals(
            &self.intervals,
            &mut self.mask,
            sample_rate,
            &self.config.intervals,
        )?;

        let rate = match compute_rate(&self.intervals, &self.mask, sample_rate) {
            Ok(rate) => Some(rate),
            Err(e) => {
                log::warn!("{} rate unavailable: {}", self.config.kind, e);
                None
            }
        };

        let respiratory_rate = match self.respiration.as_mut() {
            Some(estimator) => match estimator.estimate(
                &self.peaks,
                &self.intervals,
                Some(self.mask.as_slice()),
                sample_rate,
            ) {
                Ok(rate) => Some(rate),
                Err(e) => {
                    log::warn!("ECG-derived respiration unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(ChannelReport {
            peaks: PeakSet::new(self.peaks.clone())?,
            intervals: IntervalSeries::new(self.intervals.clone()),
            mask: ValidityMask::from(self.mask.clone()),
            filter,
            rate,
            respiratory_rate,
        })
    }

    /// Analyze consecutive whole blocks; a trailing partial block is ignored
    pub fn analyze_signal(&mut self, samples: &[f32]) -> Result<Vec<ChannelReport>> {
        let mut reports = Vec::with_capacity(samples.len() / self.block_len);
        for block in samples.chunks_exact(self.block_len) {
            reports.push(self.analyze(block)?);
        }
        Ok(reports)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Standardized samples of the last block
    pub fn standardized(&self) -> &[f32] {
        &self.standardized
    }

    /// Event regions (e.g. QRS extents) of the last block
    pub fn event_regions(&self) -> &[bool] {
        &self.regions
    }

    /// Detector scratch traces of the last block
    pub fn workspace(&self) -> &DetectorWorkspace {
        &self.workspace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::RateMethod;

    fn impulse_train(len: usize, first: usize, period: usize) -> Vec<f32> {
        let mut signal = vec![0.0; len];
        for i in (first..len).step_by(period) {
            signal[i] = 1.0;
        }
        signal
    }

    #[test]
    fn test_ecg_impulse_block() {
        let sample_rate = 250.0;
        let block = impulse_train(2500, 100, 200);
        let config = AnalyzerConfig::for_kind(SignalKind::Ecg, sample_rate);
        let mut analyzer = ChannelAnalyzer::new(config, block.len()).unwrap();

        let report = analyzer.analyze(&block).unwrap();
        assert_eq!(report.peaks.len(), 12);
        assert_eq!(report.intervals.len(), 11);
        assert!(report.intervals.iter().all(|&i| i == 200));
        assert_eq!(report.mask.valid_count(), 11);

        let rate = report.rate.unwrap();
        assert_eq!(rate.method, RateMethod::Direct);
        assert!((rate.per_minute - 75.0).abs() < 1e-3);

        // Perfectly regular beats carry no breathing modulation
        assert!(report.respiratory_rate.is_none());
        assert!(analyzer.event_regions()[100]);
    }

    #[test]
    fn test_ppg_channel_has_no_respiration_estimate() {
        let sample_rate = 100.0;
        let block: Vec<f32> = (0..1000)
            .map(|i| {
                let offset = (i % 80) as f32 - 40.0;
                (-offset * offset / 200.0).exp()
            })
            .collect();
        let config = AnalyzerConfig::for_kind(SignalKind::Ppg, sample_rate);
        let mut analyzer = ChannelAnalyzer::new(config, block.len()).unwrap();

        let report = analyzer.analyze(&block).unwrap();
        let rate = report.rate.unwrap();
        assert!((rate.per_minute - 75.0).abs() < 1e-3);
        assert!(report.respiratory_rate.is_none());
    }

    #[test]
    fn test_block_length_enforced() {
        let config = AnalyzerConfig::for_kind(SignalKind::Ecg, 250.0);
        let mut analyzer = ChannelAnalyzer::new(config.clone(), 1000).unwrap();
        assert!(matches!(
            analyzer.analyze(&[0.0; 999]),
            Err(RhythmError::InvalidBuffer { .. })
        ));
        assert!(ChannelAnalyzer::new(config, 0).is_err());
    }

    #[test]
    fn test_block_shorter_than_baseline_rejected() {
        // One-second baseline at 250 Hz needs at least 500 samples
        let config = AnalyzerConfig::for_kind(SignalKind::Ecg, 250.0);
        assert_eq!(
            ChannelAnalyzer::new(config.clone(), 499).unwrap_err(),
            RhythmError::InsufficientData {
                needed: 500,
                available: 499
            }
        );
        assert!(ChannelAnalyzer::new(config, 500).is_ok());
    }

    #[test]
    fn test_flat_block_reports_no_rate() {
        let config = AnalyzerConfig::for_kind(SignalKind::Respiration, 25.0);
        let mut analyzer = ChannelAnalyzer::new(config, 500).unwrap();
        let report = analyzer.analyze(&[1.0; 500]).unwrap();
        assert!(report.peaks.is_empty());
        assert!(report.rate.is_none());
    }

    #[test]
    fn test_report_survives_next_block() {
        let config = AnalyzerConfig::for_kind(SignalKind::Ecg, 250.0);
        let mut analyzer = ChannelAnalyzer::new(config, 2500).unwrap();

        let first = analyzer.analyze(&impulse_train(2500, 100, 200)).unwrap();
        let second = analyzer.analyze(&impulse_train(2500, 100, 250)).unwrap();

        assert_eq!(first.peaks.len(), 12);
        assert!(first.intervals.iter().all(|&i| i == 200));
        assert_eq!(second.peaks.len(), 10);
        assert!((second.rate.unwrap().per_minute - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_analyze_signal_skips_partial_block() {
        let sample_rate = 250.0;
        let mut samples = impulse_train(2500, 100, 200);
        samples.extend(impulse_train(2500, 100, 200));
        samples.extend(vec![0.0; 300]);

        let config = AnalyzerConfig::for_kind(SignalKind::Ecg, sample_rate);
        let mut analyzer = ChannelAnalyzer::new(config, 2500).unwrap();
        let reports = analyzer.analyze_signal(&samples).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].peaks, reports[1].peaks);
    }
}
