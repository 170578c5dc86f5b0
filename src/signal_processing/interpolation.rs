use crate::error::{Result, RhythmError, check_len};

/// Index of the first element of the ascending slice `x` not less than `x_new`
///
/// Returns `x.len()` when every element is smaller.
pub fn binary_search(x: &[f32], x_new: f32) -> usize {
    x.partition_point(|&v| v < x_new)
}

/// One-dimensional linear interpolation onto new abscissae
///
/// `x` must be strictly increasing. Points outside `[x[0], x[last]]` are
/// extrapolated along the nearest end segment.
///
/// # Arguments
/// * `x`, `y` - Known points, equal length, at least two
/// * `x_new` - Abscissae to evaluate
/// * `y_new` - Output buffer, same length as `x_new`
pub fn interp1d(x: &[f32], y: &[f32], x_new: &[f32], y_new: &mut [f32]) -> Result<()> {
    check_len(x.len(), y.len())?;
    check_len(x_new.len(), y_new.len())?;
    if x.len() < 2 {
        return Err(RhythmError::InsufficientData {
            needed: 2,
            available: x.len(),
        });
    }

    let last = x.len() - 1;
    for (out, &xn) in y_new.iter_mut().zip(x_new) {
        let j = binary_search(x, xn).clamp(1, last);
        let dx = x[j] - x[j - 1];
        *out = if dx > 0.0 {
            let slope = (y[j] - y[j - 1]) / dx;
            y[j - 1] + slope * (xn - x[j - 1])
        } else {
            y[j]
        };
    }
    Ok(())
}
