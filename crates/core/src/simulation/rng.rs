//! Seeded random sources for reproducible queue decisions.
//!
//! Every queue disc owns its random source. Handing each instance its own
//! stream keeps decisions reproducible regardless of how many other
//! instances exist or in which order they draw.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rand::{rngs::SmallRng, Rng, RngCore, SeedableRng};

use super::mrg32k3a::RngStream;
use crate::errors::InvalidSeed;

/// First stream index reserved for explicitly assigned streams.
///
/// Automatically allocated streams count up from zero, explicitly assigned
/// ones from here, so the two ranges can never collide.
pub const DETERMINISTIC_STREAM_BASE: u64 = 1 << 63;

/// Source of uniform random draws consumed by the decision engine.
pub trait RandomSource {
    /// Next value in [0, 1).
    fn next_uniform(&mut self) -> f64;

    /// Re-binds the source to a fixed stream index.
    ///
    /// Returns how many stream indices were consumed.
    fn assign_stream(&mut self, index: u64) -> u64;
}

/// Hands out MRG32k3a streams for one (seed, run) pair.
///
/// Clones share the automatic stream counter.
#[derive(Clone, Debug)]
pub struct SeedManager {
    seed: u32,
    run: u64,
    next_stream: Arc<AtomicU64>,
}

impl SeedManager {
    pub fn new(seed: u32, run: u64) -> Result<Self, InvalidSeed> {
        RngStream::validate_seed(seed)?;
        Ok(Self {
            seed,
            run,
            next_stream: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Allocates the next automatic stream (0, 1, 2, ... in call order).
    pub fn next_stream(&self) -> UniformStream {
        let index = self.next_stream.fetch_add(1, Ordering::SeqCst);
        self.automatic_stream(index)
    }

    /// Builds the automatic stream with the given index without touching
    /// the allocation counter.
    pub fn automatic_stream(&self, index: u64) -> UniformStream {
        UniformStream::with_absolute_stream(self.seed, self.run, index)
    }

    /// Builds the explicitly assigned stream `index`.
    pub fn stream(&self, index: u64) -> UniformStream {
        UniformStream::with_absolute_stream(self.seed, self.run, DETERMINISTIC_STREAM_BASE + index)
    }
}

/// Uniform variable drawn from one MRG32k3a stream; the run number selects
/// the substream.
#[derive(Clone, Debug)]
pub struct UniformStream {
    seed: u32,
    run: u64,
    stream: u64,
    rng: RngStream,
}

impl UniformStream {
    /// `seed` must have passed validation in [`SeedManager::new`].
    fn with_absolute_stream(seed: u32, run: u64, stream: u64) -> Self {
        Self {
            seed,
            run,
            stream,
            rng: RngStream::new_unchecked(seed, stream, run),
        }
    }

    /// Absolute stream index this variable currently draws from.
    pub fn stream(&self) -> u64 {
        self.stream
    }
}

impl RandomSource for UniformStream {
    fn next_uniform(&mut self) -> f64 {
        self.rng.rand_u01()
    }

    fn assign_stream(&mut self, index: u64) -> u64 {
        *self = Self::with_absolute_stream(self.seed, self.run, DETERMINISTIC_STREAM_BASE + index);
        1
    }
}

/// Adapts any seedable `rand` generator to [`RandomSource`].
///
/// Assigning a stream reseeds the generator with a seed derived from the
/// base seed and the stream index.
#[derive(Clone, Debug)]
pub struct SeededRng<R = SmallRng> {
    seed: u64,
    inner: R,
}

impl<R: SeedableRng + RngCore> SeededRng<R> {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: R::seed_from_u64(seed),
        }
    }

    /// Returns the seed used to create this source.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl<R: SeedableRng + RngCore> RandomSource for SeededRng<R> {
    fn next_uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    fn assign_stream(&mut self, index: u64) -> u64 {
        let derived_seed = self
            .seed
            .wrapping_mul(0x517cc1b727220a95)
            .wrapping_add(index);
        self.inner = R::seed_from_u64(derived_seed);
        1
    }
}
