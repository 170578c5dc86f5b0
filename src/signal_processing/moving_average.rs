use crate::error::{Result, RhythmError, check_len};

/// Centered boxcar moving average of a whole block
///
/// Each output sample is the arithmetic mean of the `window` input samples
/// centered on it. Near the block edges the window is truncated and the mean
/// is taken over the samples actually covered, so the output has no
/// zero-padding bias.
///
/// Runs in one pass with a running sum and writes into a caller-owned buffer.
///
/// # Arguments
/// * `src` - Input samples
/// * `dst` - Output buffer, same length as `src`
/// * `window` - Window length in samples (larger = smoother)
pub fn boxcar_average_into(src: &[f32], dst: &mut [f32], window: usize) -> Result<()> {
    check_len(src.len(), dst.len())?;
    if window == 0 {
        return Err(RhythmError::InvalidParameter(
            "moving average window must be positive",
        ));
    }

    let n = src.len();
    let before = (window - 1) / 2;
    let after = window - 1 - before;

    let mut sum = 0.0f32;
    let mut lo = 0usize;
    let mut hi = 0usize;

    for (i, out) in dst.iter_mut().enumerate() {
        let want_lo = i.saturating_sub(before);
        let want_hi = (i + after + 1).min(n);

        while hi < want_hi {
            sum += src[hi];
            hi += 1;
        }
        while lo < want_lo {
            sum -= src[lo];
            lo += 1;
        }

        *out = sum / (hi - lo) as f32;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxcar_average() {
        let src = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut dst = [0.0; 5];
        boxcar_average_into(&src, &mut dst, 3).unwrap();

        assert!((dst[0] - 1.5).abs() < 0.01); // (1+2)/2, truncated window
        assert!((dst[1] - 2.0).abs() < 0.01);
        assert!((dst[2] - 3.0).abs() < 0.01);
        assert!((dst[3] - 4.0).abs() < 0.01);
        assert!((dst[4] - 4.5).abs() < 0.01); // (4+5)/2
    }

    #[test]
    fn test_boxcar_even_window() {
        let src = [0.0, 0.0, 4.0, 0.0, 0.0, 0.0];
        let mut dst = [0.0; 6];
        boxcar_average_into(&src, &mut dst, 2).unwrap();

        // Window covers [i, i + 1]
        assert_eq!(dst, [0.0, 2.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_boxcar_window_one_is_identity() {
        let src = [0.5, -1.0, 3.0];
        let mut dst = [0.0; 3];
        boxcar_average_into(&src, &mut dst, 1).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_boxcar_rejects_bad_arguments() {
        let src = [1.0, 2.0];
        let mut dst = [0.0; 2];
        assert!(boxcar_average_into(&src, &mut dst, 0).is_err());

        let mut short = [0.0; 1];
        assert!(boxcar_average_into(&src, &mut short, 1).is_err());
    }
}
