use thiserror::Error;
use vsearch_core::TrialPhase;

/// Reasons a configuration is rejected before a session starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("set size list is empty")]
    EmptySetSizes,

    #[error("display duration list is empty")]
    EmptyDurations,

    #[error("set sizes must be at least 1")]
    ZeroSetSize,

    #[error("display durations must be positive")]
    ZeroDuration,

    #[error("{phase} repetitions per condition must be a positive even number, got {reps}")]
    InvalidRepetitions { phase: TrialPhase, reps: u32 },

    #[error("block size must be positive")]
    ZeroBlockSize,

    #[error("fixation range is inverted: {min} > {max}")]
    FixationRange { min: u64, max: u64 },

    #[error("decision deadline must be positive")]
    ZeroDeadline,

    #[error("invalid key name {0:?}")]
    InvalidKey(String),

    #[error("key {0:?} is bound to more than one action")]
    DuplicateKey(String),

    #[error("stimulus edges must satisfy 0 < short ({short}) <= long ({long})")]
    StimulusGeometry { long: f32, short: f32 },

    #[error("margin fraction must lie in [0, 0.5), got {0}")]
    Margin(f32),

    #[error("padding must not be negative, got {0}")]
    Padding(f32),

    #[error("usable region {width}x{height} cannot hold a {footprint} px stimulus")]
    ViewportTooSmall {
        width: f32,
        height: f32,
        footprint: f32,
    },

    #[error("grid of {rows}x{cols} cells ({cell_width}x{cell_height} px) cannot hold a {needed} px footprint")]
    GridTooSmall {
        rows: usize,
        cols: usize,
        cell_width: f32,
        cell_height: f32,
        needed: f32,
    },

    #[error("rejection sampling needs a positive attempt budget")]
    ZeroAttempts,

    #[error("set size {set_size} exceeds the {strategy} placement capacity of {capacity}")]
    CapacityExceeded {
        set_size: u32,
        capacity: usize,
        strategy: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
