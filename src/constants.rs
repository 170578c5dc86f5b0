//! Numeric constants for signal processing stability
//!
//! These constants define thresholds and epsilon values used throughout
//! the rhythm pipeline to ensure numerical stability.

/// Epsilon below which a DC level or AC amplitude is treated as zero.
/// Used by the perfusion ratio before dividing by either term.
pub const DIVISION_EPSILON: f32 = 1e-10;

/// Epsilon guarding standardization against near-constant blocks.
pub const STANDARDIZE_EPSILON: f32 = 1e-3;

/// Sample-rate comparisons between a signal and its detector configuration.
pub const SAMPLE_RATE_TOLERANCE: f32 = 1e-3;

/// Minimum in-band magnitude for a spectral peak to count as dominant.
/// A detrended constant tachogram leaves only rounding residue, orders of
/// magnitude below this.
pub const SPECTRAL_FLOOR: f32 = 1e-4;

/// Seconds per minute, for rate conversions.
pub const SECONDS_PER_MINUTE: f32 = 60.0;
