use crate::config::{IntervalFilterConfig, QuotientFilterConfig};
use crate::error::{Result, RhythmError, check_len};

/// Outcome of a bounded quotient filter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotientFilterReport {
    /// Passes actually run
    pub passes: usize,
    /// Values newly masked over all passes
    pub masked: usize,
    /// Whether a pass finished without masking anything
    pub converged: bool,
}

/// Outcome of the combined range and quotient filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalFilterReport {
    /// Intervals masked for lying outside the plausible range
    pub range_masked: usize,
    pub quotient: QuotientFilterReport,
}

impl IntervalFilterReport {
    pub fn total_masked(&self) -> usize {
        self.range_masked + self.quotient.masked
    }
}

/// Mask intervals whose duration lies outside `[min_secs, max_secs]`
///
/// Already masked intervals stay masked. Returns the number of intervals
/// newly masked.
pub fn range_filter(
    intervals: &[u32],
    mask: &mut [bool],
    sample_rate: f32,
    min_secs: f32,
    max_secs: f32,
) -> Result<usize> {
    check_len(intervals.len(), mask.len())?;
    validate_range(sample_rate, min_secs, max_secs)?;

    let mut masked = 0;
    for (flag, &interval) in mask.iter_mut().zip(intervals) {
        if *flag {
            continue;
        }
        let secs = interval as f32 / sample_rate;
        if secs < min_secs || secs > max_secs {
            *flag = true;
            masked += 1;
        }
    }
    Ok(masked)
}

/// Iterative ratio filter over any positive-integer series
///
/// Each pass compares every unmasked value with its nearest unmasked
/// neighbour on each side (only one side at either end of the series). A
/// comparison passes when the ratio and its reciprocal both lie in
/// `[lowcut, highcut]`; zero values never pass. A value failing any
/// comparison is masked, so a beat split into two agreeing halves is caught
/// as well as a lone outlier, at the cost of the intervals next to it. Each
/// pass decides against the mask as it stood when the pass began, so masking
/// a value does not change how its neighbours are judged until the next pass.
///
/// Stops after `iterations` passes or as soon as a pass masks nothing.
pub fn quotient_filter(
    data: &[u32],
    mask: &mut [bool],
    config: &QuotientFilterConfig,
) -> Result<QuotientFilterReport> {
    check_len(data.len(), mask.len())?;
    config.validate()?;

    let mut report = QuotientFilterReport::default();
    while report.passes < config.iterations {
        report.passes += 1;
        let masked = quotient_pass(data, mask, config);
        log::trace!("Quotient pass {}: {} masked", report.passes, masked);
        if masked == 0 {
            report.converged = true;
            break;
        }
        report.masked += masked;
    }
    Ok(report)
}

/// Range filter followed by the quotient filter
///
/// The quotient filter compares neighbouring magnitudes, so it only ever
/// sees intervals that already passed the range check. Every argument is
/// validated before the mask is touched.
pub fn filter_intervals(
    intervals: &[u32],
    mask: &mut [bool],
    sample_rate: f32,
    config: &IntervalFilterConfig,
) -> Result<IntervalFilterReport> {
    check_len(intervals.len(), mask.len())?;
    validate_range(sample_rate, config.min_interval, config.max_interval)?;
    let quotient = config.quotient();
    quotient.validate()?;

    let range_masked = range_filter(
        intervals,
        mask,
        sample_rate,
        config.min_interval,
        config.max_interval,
    )?;
    let quotient = quotient_filter(intervals, mask, &quotient)?;

    log::debug!(
        "Interval filter: {} intervals, {} out of range, {} by quotient in {} passes",
        intervals.len(),
        range_masked,
        quotient.masked,
        quotient.passes
    );

    Ok(IntervalFilterReport {
        range_masked,
        quotient,
    })
}

fn validate_range(sample_rate: f32, min_secs: f32, max_secs: f32) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(RhythmError::InvalidParameter("sample rate must be positive"));
    }
    if !(min_secs > 0.0 && min_secs <= max_secs && max_secs.is_finite()) {
        return Err(RhythmError::InvalidParameter(
            "interval bounds must satisfy 0 < min <= max",
        ));
    }
    Ok(())
}

fn quotient_pass(data: &[u32], mask: &mut [bool], config: &QuotientFilterConfig) -> usize {
    // The next entry is read straight from the mask, which the pass has not
    // reached yet; the previous one comes from the cursor.
    let mut prev: Option<usize> = None;
    let mut current = next_valid(mask, 0);
    let mut masked = 0;

    while let Some(cur) = current {
        let next = next_valid(mask, cur + 1);
        let rejected = [prev, next]
            .into_iter()
            .flatten()
            .any(|reference| !within_band(data[cur], data[reference], config));
        if rejected {
            mask[cur] = true;
            masked += 1;
        }

        prev = Some(cur);
        current = next;
    }
    masked
}

fn next_valid(mask: &[bool], from: usize) -> Option<usize> {
    mask[from..].iter().position(|&m| !m).map(|i| i + from)
}

fn within_band(value: u32, reference: u32, config: &QuotientFilterConfig) -> bool {
    if value == 0 || reference == 0 {
        return false;
    }
    let ratio = value as f32 / reference as f32;
    let inverse = reference as f32 / value as f32;
    let band = config.lowcut..=config.highcut;
    band.contains(&ratio) && band.contains(&inverse)
}
