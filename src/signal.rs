use crate::error::{Result, RhythmError};

/// A borrowed block of single-precision samples at a fixed sample rate
///
/// The samples belong to the caller and are never modified.
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a> {
    samples: &'a [f32],
    sample_rate: f32,
}

impl<'a> Signal<'a> {
    /// Wrap a sample block
    ///
    /// # Arguments
    /// * `samples` - Conditioned (detrended, band-limited) samples
    /// * `sample_rate` - Sample rate in Hz, must be positive and finite
    pub fn new(samples: &'a [f32], sample_rate: f32) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(RhythmError::InvalidParameter("sample rate must be positive"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the block in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rejects_bad_rate() {
        let samples = [0.0f32; 4];
        assert!(Signal::new(&samples, 0.0).is_err());
        assert!(Signal::new(&samples, f32::NAN).is_err());
        assert!(Signal::new(&samples, -250.0).is_err());
    }

    #[test]
    fn test_signal_duration() {
        let samples = vec![0.0f32; 500];
        let signal = Signal::new(&samples, 250.0).unwrap();
        assert_eq!(signal.len(), 500);
        assert!((signal.duration_secs() - 2.0).abs() < 1e-6);
    }
}
