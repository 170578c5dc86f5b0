pub mod config;
pub mod constants;
pub mod error;
pub mod processing;
pub mod rhythm;
pub mod signal;
pub mod signal_processing;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{AnalyzerConfig, DetectorConfig, SignalKind};
pub use error::{Result, RhythmError};
pub use processing::{ChannelAnalyzer, ChannelReport};
pub use signal::Signal;
