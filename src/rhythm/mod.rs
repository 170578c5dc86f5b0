//! Interval extraction, artifact rejection and rate estimation
//!
//! Peaks from the detector become interval series; the artifact filters mark
//! implausible intervals; the direct and spectral estimators turn what is
//! left into rates. The perfusion estimator works on AC/DC levels and is
//! independent of the peak train.

pub mod artifact_filter;
pub mod intervals;
pub mod perfusion;
pub mod rate;
pub mod respiration;

pub use artifact_filter::{
    IntervalFilterReport, QuotientFilterReport, filter_intervals, quotient_filter, range_filter,
};
pub use intervals::{
    IntervalSeries, ValidityMask, compute_intervals, compute_intervals_into, reconstruct_peaks,
};
pub use perfusion::{Perfusion, Spo2Estimate, perfusion_ratio, spo2_from_perfusion, spo2_in_time};
pub use rate::{RateEstimate, RateMethod, compute_rate};
pub use respiration::{SpectralRateEstimator, Tachogram};
