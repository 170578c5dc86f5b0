use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::error::{Result, RhythmError, check_len};

/// Fill `window` with symmetric Blackman coefficients
///
/// `w[n] = 0.42 - 0.5·cos(2πn/(M-1)) + 0.08·cos(4πn/(M-1))`
pub fn blackman_window_into(window: &mut [f32]) {
    let len = window.len();
    match len {
        0 => return,
        1 => {
            window[0] = 1.0;
            return;
        }
        _ => {}
    }
    let denom = (len - 1) as f32;
    for (n, w) in window.iter_mut().enumerate() {
        let phase = 2.0 * PI * n as f32 / denom;
        *w = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();
    }
    // Exact zeros at the ends regardless of rounding
    window[0] = 0.0;
    window[len - 1] = 0.0;
}

/// Fill `bins` with the frequency of each FFT bin: `k · sample_rate / fft_len`
pub fn frequency_bins_into(bins: &mut [f32], sample_rate: f32, fft_len: usize) -> Result<()> {
    if fft_len == 0 {
        return Err(RhythmError::InvalidParameter("FFT length must be positive"));
    }
    let resolution = sample_rate / fft_len as f32;
    for (k, bin) in bins.iter_mut().enumerate() {
        *bin = k as f32 * resolution;
    }
    Ok(())
}

/// Magnitude of each complex bin
pub fn magnitude_into(spectrum: &[Complex32], magnitudes: &mut [f32]) -> Result<()> {
    check_len(spectrum.len(), magnitudes.len())?;
    for (m, c) in magnitudes.iter_mut().zip(spectrum) {
        *m = c.norm();
    }
    Ok(())
}

/// Forward real-input magnitude spectrum with reusable plans and buffers
///
/// Input blocks are zero-padded to the next power of two. Plans are cached
/// by the planner, and the working buffers only grow, so repeated calls with
/// similar block lengths do not allocate.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
    fft: Option<(usize, Arc<dyn Fft<f32>>)>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("fft_len", &self.fft.as_ref().map(|(len, _)| *len))
            .finish()
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            fft: None,
            buffer: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Compute the one-sided magnitude spectrum of `input`
    ///
    /// On success `magnitudes` holds `fft_len / 2 + 1` bins and the FFT
    /// length is returned; bin `k` lies at `k · fs / fft_len`.
    pub fn magnitude_spectrum(&mut self, input: &[f32], magnitudes: &mut Vec<f32>) -> Result<usize> {
        if input.is_empty() {
            return Err(RhythmError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        let fft_len = input.len().next_power_of_two();
        let fft = self.plan(fft_len);

        self.buffer.clear();
        self.buffer
            .extend(input.iter().map(|&x| Complex32::new(x, 0.0)));
        self.buffer.resize(fft_len, Complex32::new(0.0, 0.0));

        let scratch_len = fft.get_inplace_scratch_len();
        if self.scratch.len() < scratch_len {
            self.scratch.resize(scratch_len, Complex32::new(0.0, 0.0));
        }
        fft.process_with_scratch(&mut self.buffer, &mut self.scratch[..scratch_len]);

        let bins = fft_len / 2 + 1;
        magnitudes.clear();
        magnitudes.resize(bins, 0.0);
        magnitude_into(&self.buffer[..bins], magnitudes)?;
        Ok(fft_len)
    }

    fn plan(&mut self, fft_len: usize) -> Arc<dyn Fft<f32>> {
        match &self.fft {
            Some((len, fft)) if *len == fft_len => Arc::clone(fft),
            _ => {
                let fft = self.planner.plan_fft_forward(fft_len);
                self.fft = Some((fft_len, Arc::clone(&fft)));
                fft
            }
        }
    }
}
