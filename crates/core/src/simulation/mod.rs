//! Deterministic inputs for the queue disc.
//!
//! A queue disc consumes two external inputs that must be reproducible for
//! its decisions to be:
//!
//! - **TimeSource**: Abstraction over the clock (real vs virtual), read only to
//!   measure idle periods
//! - **RandomSource**: Seeded uniform draws, independently indexable per instance
//!
//! # Reproducibility
//!
//! Identical (seed, run, stream) triples together with identical enqueue
//! sequences produce bit-identical decisions. Streams come from
//! [`SeedManager`], which splits one MRG32k3a sequence into non-overlapping
//! streams (one per instance) and substreams (one per run).
//!
//! ```ignore
//! let seeds = SeedManager::new(1, 17)?;
//! let time = VirtualTime::new();
//! let mut disc = RedQueueDisc::new(config, seeds.next_stream(), time.clone())?;
//! ```

mod mrg32k3a;
mod rng;
mod time;

pub use mrg32k3a::RngStream;
pub use rng::{RandomSource, SeedManager, SeededRng, UniformStream, DETERMINISTIC_STREAM_BASE};
pub use time::{RealTime, TimeSource, VirtualTime};
