use thiserror::Error;

/// Reasons a [`RedConfig`](crate::config::RedConfig) is rejected.
///
/// Validation happens before anything is applied, so a rejected configuration
/// never leaves a queue disc half-configured.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("minimum threshold must be positive, got {0}")]
    NonPositiveMinThreshold(f64),

    #[error("minimum threshold {min} must be below maximum threshold {max}")]
    ThresholdOrder { min: f64, max: f64 },

    #[error("queue limit {limit} is below maximum threshold {max_th}")]
    QueueLimitBelowMaxThreshold { limit: u32, max_th: f64 },

    #[error("queue weight must lie in (0, 1], got {0}")]
    QueueWeightOutOfRange(f64),

    #[error("mean packet size must be non-zero")]
    ZeroMeanPacketSize,

    #[error("maximum probability divisor must be at least 1, got {0}")]
    InvalidMaxProbabilityDivisor(f64),

    #[error("link bandwidth must be non-zero")]
    ZeroLinkBandwidth,

    #[error(transparent)]
    Seed(#[from] InvalidSeed),

    #[error("failed reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The seed cannot drive the combined recursive generator.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("seed {0} must be non-zero and below 4294944443")]
pub struct InvalidSeed(pub u32);

#[derive(Debug, Error)]
pub enum QueueDiscError {
    /// `enqueue`/`dequeue` was called before `initialize`.
    #[error("queue disc used before initialization")]
    NotInitialized,

    /// `configure` was called after `initialize`.
    #[error("queue disc configuration is frozen after initialization")]
    AlreadyInitialized,

    #[error("rejected configuration: {0}")]
    Config(#[from] ConfigError),
}
