use rolling_stats::Stats;

use crate::error::{Result, check_len};

/// Running statistics of a block (count, mean, standard deviation, min, max)
pub fn block_stats(samples: &[f32]) -> Stats<f32> {
    let mut stats = Stats::new();
    for &sample in samples {
        stats.update(sample);
    }
    stats
}

/// Arithmetic mean; zero for an empty block
pub fn mean(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

/// Standard deviation; zero for blocks shorter than two samples
pub fn std_dev(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    block_stats(samples).std_dev
}

/// Root mean square; zero for an empty block
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Gradient in samples: central differences inside, one-sided at the edges
///
/// # Arguments
/// * `src` - Input samples
/// * `dst` - Output buffer, same length as `src`
pub fn gradient_into(src: &[f32], dst: &mut [f32]) -> Result<()> {
    check_len(src.len(), dst.len())?;
    match src.len() {
        0 => {}
        1 => dst[0] = 0.0,
        n => {
            dst[0] = src[1] - src[0];
            dst[n - 1] = src[n - 1] - src[n - 2];
            for i in 1..n - 1 {
                dst[i] = 0.5 * (src[i + 1] - src[i - 1]);
            }
        }
    }
    Ok(())
}

/// Standardize: `y = (x - mean) / max(std, epsilon)`
///
/// The epsilon keeps near-constant blocks from being blown up into noise.
pub fn standardize_into(src: &[f32], dst: &mut [f32], epsilon: f32) -> Result<()> {
    check_len(src.len(), dst.len())?;
    let stats = block_stats(src);
    let scale = if src.len() < 2 {
        epsilon
    } else {
        stats.std_dev.max(epsilon)
    };
    for (out, &x) in dst.iter_mut().zip(src) {
        *out = (x - stats.mean) / scale;
    }
    Ok(())
}
