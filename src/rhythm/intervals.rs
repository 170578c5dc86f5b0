use crate::error::{Result, RhythmError, check_increasing};
use crate::signal_processing::PeakSet;

/// Gaps in samples between consecutive peaks
///
/// Always one shorter than the peak set it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSeries(Vec<u32>);

impl IntervalSeries {
    pub fn new(intervals: Vec<u32>) -> Self {
        Self(intervals)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u32> {
        self.0.iter()
    }

    /// Intervals converted to seconds
    pub fn seconds(&self, sample_rate: f32) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().map(move |&n| n as f32 / sample_rate)
    }
}

impl AsRef<[u32]> for IntervalSeries {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

/// Per-interval exclusion flags; `true` means the interval is an artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityMask(Vec<bool>);

impl ValidityMask {
    /// A mask of `len` entries with nothing excluded
    pub fn new(len: usize) -> Self {
        Self(vec![false; len])
    }

    /// A mask sized to `intervals` with nothing excluded
    pub fn for_intervals(intervals: &IntervalSeries) -> Self {
        Self::new(intervals.len())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_masked(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Number of intervals still usable for rate estimation
    pub fn valid_count(&self) -> usize {
        self.0.iter().filter(|&&masked| !masked).count()
    }

    pub fn masked_count(&self) -> usize {
        self.0.len() - self.valid_count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [bool] {
        &mut self.0
    }
}

impl From<Vec<bool>> for ValidityMask {
    fn from(flags: Vec<bool>) -> Self {
        Self(flags)
    }
}

/// Intervals between consecutive peaks
///
/// Fewer than two peaks give an empty series.
pub fn compute_intervals(peaks: &PeakSet) -> Result<IntervalSeries> {
    let mut intervals = Vec::with_capacity(peaks.len().saturating_sub(1));
    compute_intervals_into(peaks.as_slice(), &mut intervals)?;
    Ok(IntervalSeries(intervals))
}

/// Intervals between consecutive peaks into a reusable buffer
///
/// `peaks` must be strictly increasing and every gap must fit in a `u32`;
/// otherwise `intervals` is left untouched.
pub fn compute_intervals_into(peaks: &[usize], intervals: &mut Vec<u32>) -> Result<usize> {
    check_increasing(peaks)?;
    for pair in peaks.windows(2) {
        if u32::try_from(pair[1] - pair[0]).is_err() {
            return Err(RhythmError::InvalidParameter(
                "peak interval does not fit in 32 bits",
            ));
        }
    }

    intervals.clear();
    intervals.extend(peaks.windows(2).map(|pair| (pair[1] - pair[0]) as u32));
    Ok(intervals.len())
}

/// Rebuild peak positions from a first peak and the intervals that follow it
pub fn reconstruct_peaks(first: usize, intervals: &IntervalSeries) -> Result<PeakSet> {
    let mut peaks = Vec::with_capacity(intervals.len() + 1);
    let mut position = first;
    peaks.push(position);
    for &interval in intervals.iter() {
        position += interval as usize;
        peaks.push(position);
    }
    PeakSet::new(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_intervals() {
        let peaks = PeakSet::new(vec![10, 110, 215, 300]).unwrap();
        let intervals = compute_intervals(&peaks).unwrap();
        assert_eq!(intervals.as_slice(), &[100, 105, 85]);
        assert_eq!(intervals.len(), peaks.len() - 1);
    }

    #[test]
    fn test_too_few_peaks_gives_empty_series() {
        let none = compute_intervals(&PeakSet::default()).unwrap();
        assert!(none.is_empty());

        let one = compute_intervals(&PeakSet::new(vec![42]).unwrap()).unwrap();
        assert!(one.is_empty());
    }

    #[test]
    fn test_compute_intervals_into_rejects_unordered() {
        let mut intervals = vec![1, 2, 3];
        let err = compute_intervals_into(&[5, 9, 9], &mut intervals).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidParameter(_)));
        assert_eq!(intervals, vec![1, 2, 3]);

        assert_eq!(compute_intervals_into(&[5, 9, 20], &mut intervals).unwrap(), 2);
        assert_eq!(intervals, vec![4, 11]);
    }

    #[test]
    fn test_reconstruct_peaks() {
        let peaks = PeakSet::new(vec![37, 240, 441, 650, 849]).unwrap();
        let intervals = compute_intervals(&peaks).unwrap();
        let rebuilt = reconstruct_peaks(peaks.as_slice()[0], &intervals).unwrap();
        assert_eq!(rebuilt, peaks);
    }

    #[test]
    fn test_interval_seconds() {
        let intervals = IntervalSeries::new(vec![100, 150]);
        let seconds: Vec<f32> = intervals.seconds(100.0).collect();
        assert_eq!(seconds, vec![1.0, 1.5]);
    }

    #[test]
    fn test_validity_mask_counts() {
        let mut mask = ValidityMask::new(4);
        assert_eq!(mask.valid_count(), 4);
        mask.as_mut_slice()[2] = true;
        assert!(mask.is_masked(2));
        assert!(!mask.is_masked(99));
        assert_eq!(mask.valid_count(), 3);
        assert_eq!(mask.masked_count(), 1);
    }
}
