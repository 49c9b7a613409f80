/// Queue disc configuration loading and logging setup.
pub mod config;

/// Error types shared across the crate.
pub mod errors;

/// Queue discs and queue items; the RED implementation lives here.
pub mod queue_disc;

/// Scripted traffic runs over a single queue disc.
pub mod scenario;

/// Deterministic clock and random stream sources.
pub mod simulation;

/// Tracing infrastructure.
#[cfg_attr(test, allow(dead_code))]
pub mod tracing;

pub use errors::{ConfigError, InvalidSeed, QueueDiscError};
pub use queue_disc::red::{
    DropReason, EnqueueOutcome, QueueMode, RedConfig, RedConfigBuilder, RedQueueDisc, RedStats,
    SharedQueueDisc,
};
