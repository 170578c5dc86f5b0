use crate::config::CalibrationCoefficients;
use crate::constants::DIVISION_EPSILON;
use crate::error::{Result, RhythmError, check_len};
use crate::signal_processing::math::block_stats;

/// Pulsatile (AC) and baseline (DC) amplitude of one optical channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perfusion {
    pub ac: f32,
    pub dc: f32,
}

impl Perfusion {
    pub fn new(ac: f32, dc: f32) -> Self {
        Self { ac, dc }
    }

    /// AC as the standard deviation and DC as the mean of a raw block
    pub fn from_block(block: &[f32]) -> Result<Self> {
        require_block(block)?;
        let stats = block_stats(block);
        Ok(Self {
            ac: stats.std_dev,
            dc: stats.mean,
        })
    }

    /// AC from a (typically band-passed) block, DC measured upstream
    pub fn from_block_with_dc(block: &[f32], dc: f32) -> Result<Self> {
        require_block(block)?;
        Ok(Self {
            ac: block_stats(block).std_dev,
            dc,
        })
    }

    /// Perfusion index `ac / dc`
    pub fn index(&self) -> Result<f32> {
        if self.dc.abs() < DIVISION_EPSILON {
            return Err(RhythmError::DivisionByZero("DC level is zero"));
        }
        Ok(self.ac / self.dc)
    }
}

/// Ratio of perfusion indices and the saturation it maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spo2Estimate {
    /// `(ac1/dc1) / (ac2/dc2)`
    pub ratio: f32,
    /// Oxygen saturation in percent, within `[0, 100]`
    pub saturation: f32,
}

/// Ratio of the first channel's perfusion index to the second's
pub fn perfusion_ratio(first: &Perfusion, second: &Perfusion) -> Result<f32> {
    if first.dc.abs() < DIVISION_EPSILON || second.dc.abs() < DIVISION_EPSILON {
        return Err(RhythmError::DivisionByZero("DC level is zero"));
    }
    if second.ac.abs() < DIVISION_EPSILON {
        return Err(RhythmError::DivisionByZero("second channel has no pulsatile component"));
    }
    Ok((first.ac / first.dc) / (second.ac / second.dc))
}

/// Oxygen saturation from two channels' AC and DC amplitudes
///
/// `saturation = c0·r² + c1·r + c2`, clamped to `[0, 100]`.
pub fn spo2_from_perfusion(
    first: &Perfusion,
    second: &Perfusion,
    coefs: &CalibrationCoefficients,
) -> Result<Spo2Estimate> {
    let ratio = perfusion_ratio(first, second)?;
    let saturation = coefs.apply(ratio).clamp(0.0, 100.0);
    log::debug!("SpO2 {:.1}% from ratio {:.4}", saturation, ratio);
    Ok(Spo2Estimate { ratio, saturation })
}

/// Oxygen saturation from two equally long raw blocks
///
/// AC is each block's standard deviation and DC its mean.
pub fn spo2_in_time(
    first: &[f32],
    second: &[f32],
    coefs: &CalibrationCoefficients,
) -> Result<Spo2Estimate> {
    check_len(first.len(), second.len())?;
    let first = Perfusion::from_block(first)?;
    let second = Perfusion::from_block(second)?;
    spo2_from_perfusion(&first, &second, coefs)
}

fn require_block(block: &[f32]) -> Result<()> {
    if block.len() < 2 {
        return Err(RhythmError::InsufficientData {
            needed: 2,
            available: block.len(),
        });
    }
    Ok(())
}
