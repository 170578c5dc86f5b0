mod noise;
mod signal;

pub use noise::{
    AdditiveNoiseConfig, BaselineWanderConfig, MotionArtifactConfig, NoiseConfig, apply_noise,
    generate_noisy_beat_train,
};
pub use signal::{
    BeatTrainConfig, PulseShape, SyntheticSignal, T_WAVE_AMPLITUDE, T_WAVE_DELAY_SECS, beat_times,
    ppg_pair, synthesize,
};
