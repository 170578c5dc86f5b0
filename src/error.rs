use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RhythmError {
    #[error("Invalid buffer: expected length {expected}, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Insufficient data: need {needed} samples, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("No valid intervals remain after artifact filtering")]
    InsufficientValidData,

    #[error("No dominant frequency between {low_hz:.2} and {high_hz:.2} Hz")]
    NoDominantFrequency { low_hz: f32, high_hz: f32 },

    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RhythmError>;

/// Fail with `InvalidBuffer` unless `actual == expected`.
pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RhythmError::InvalidBuffer { expected, actual })
    }
}

/// Fail with `InvalidParameter` unless `indices` is strictly increasing.
pub(crate) fn check_increasing(indices: &[usize]) -> Result<()> {
    if indices.windows(2).any(|w| w[1] <= w[0]) {
        return Err(RhythmError::InvalidParameter(
            "peak indices must be strictly increasing",
        ));
    }
    Ok(())
}
