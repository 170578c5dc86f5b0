pub mod interpolation;
pub mod math;
pub mod moving_average;
pub mod peak_detector;
pub mod spectral;

pub use interpolation::{binary_search, interp1d};
pub use math::{block_stats, gradient_into, mean, rms, standardize_into, std_dev};
pub use moving_average::boxcar_average_into;
pub use peak_detector::{DetectorWorkspace, PeakDetector, PeakSet};
pub use spectral::{SpectrumAnalyzer, blackman_window_into, frequency_bins_into};
