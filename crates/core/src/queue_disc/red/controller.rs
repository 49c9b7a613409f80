//! RED queue disc.
//!
//! This module contains the queue disc itself: the FIFO store, the admission
//! path that runs every arrival through the capacity guard, the estimator and
//! the decision engine, and the removal path that tracks idle periods.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{ConfigError, QueueDiscError};
use crate::queue_disc::item::QueueDiscItem;
use crate::simulation::{RandomSource, RealTime, TimeSource, UniformStream};

use super::config::{QueueMode, RedConfig};
use super::decision::{Decision, DecisionEngine};
use super::estimator::AverageQueueEstimator;
use super::stats::RedStats;

/// A queue disc shared between threads.
///
/// Every decision depends on the full, ordered history of arrivals and
/// departures, so the whole instance sits behind a single lock.
pub type SharedQueueDisc<I, R = UniformStream, T = RealTime> = Arc<Mutex<RedQueueDisc<I, R, T>>>;

/// Why an arrival was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Early action on an item that could not be marked.
    Unforced,
    /// The average reached the forced-drop region.
    Forced,
    /// Admitting the item would exceed the queue limit.
    QueueLimit,
}

/// Result of [`RedQueueDisc::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnqueueOutcome {
    Admitted,
    /// Admitted after its codepoint was rewritten to CE.
    Marked,
    Dropped(DropReason),
}

impl EnqueueOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, EnqueueOutcome::Admitted | EnqueueOutcome::Marked)
    }
}

/// State created by `initialize` and mutated only by enqueue and dequeue.
pub(crate) struct Runtime<I> {
    pub(crate) queue: VecDeque<I>,
    pub(crate) bytes: u64,
    pub(crate) estimator: AverageQueueEstimator,
    pub(crate) engine: DecisionEngine,
    pub(crate) stats: RedStats,
}

impl<I> Runtime<I> {
    fn occupancy(&self, mode: QueueMode) -> u64 {
        match mode {
            QueueMode::Packets => self.queue.len() as u64,
            QueueMode::Bytes => self.bytes,
        }
    }
}

/// Random Early Detection queue disc with ECN marking.
///
/// Arrivals are admitted, marked or dropped depending on an exponentially
/// weighted average of the occupancy:
///
/// ```text
///   drop/mark
///   probability
///        1 |                        ______ forced
///          |                      /
///     maxP |            ________/  gentle
///          |          /
///        0 |_________/
///          +---------+--------+-------+----> average
///                  min_th   max_th  2*max_th
/// ```
///
/// ## Lifecycle
///
/// A queue disc must be [`initialize`](Self::initialize)d before use.
/// Initializing clears the queue, the average and the statistics.
/// [`configure`](Self::configure) is only accepted before that; the
/// configuration stays frozen for the lifetime of the instance.
///
/// ## Type Parameters
///
/// - `I`: the queued item.
/// - `R`: the random source. Defaults to an MRG32k3a [`UniformStream`].
/// - `T`: the clock, read to measure idle periods. Defaults to `RealTime`;
///   tests and simulations use `VirtualTime`.
pub struct RedQueueDisc<I, R = UniformStream, T = RealTime> {
    pub(crate) config: RedConfig,
    pub(crate) rng: R,
    pub(crate) time_source: T,
    pub(crate) runtime: Option<Runtime<I>>,
}

impl<I, R, T> RedQueueDisc<I, R, T>
where
    I: QueueDiscItem,
    R: RandomSource,
    T: TimeSource,
{
    /// Creates an uninitialized queue disc.
    pub fn new(config: RedConfig, rng: R, time_source: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            time_source,
            runtime: None,
        })
    }

    /// Wraps the queue disc for use from several threads.
    pub fn into_shared(self) -> SharedQueueDisc<I, R, T> {
        Arc::new(Mutex::new(self))
    }

    /// Validates and applies a new configuration.
    ///
    /// The configuration is frozen once the queue disc is initialized; later
    /// calls fail with [`QueueDiscError::AlreadyInitialized`]. On failure
    /// nothing changes.
    pub fn configure(&mut self, config: RedConfig) -> Result<(), QueueDiscError> {
        if self.runtime.is_some() {
            tracing::warn!("Configuration change on an initialized queue disc");
            return Err(QueueDiscError::AlreadyInitialized);
        }
        if let Err(err) = config.validate() {
            tracing::warn!(error = %err, "Rejected queue disc configuration");
            return Err(err.into());
        }
        tracing::debug!(
            mode = %config.mode,
            min_th = config.min_th,
            max_th = config.max_th,
            queue_limit = config.queue_limit,
            queue_weight = config.queue_weight,
            use_ecn = config.use_ecn,
            "Queue disc configured"
        );
        self.config = config;
        Ok(())
    }

    /// Resets the queue, the estimator and the statistics.
    ///
    /// The queue disc starts out idle as of now.
    pub fn initialize(&mut self) {
        let now = self.time_source.now();
        let mut estimator = AverageQueueEstimator::new(
            self.config.queue_weight,
            self.config.packet_time_constant(),
        );
        estimator.reset(now);
        self.runtime = Some(Runtime {
            queue: VecDeque::new(),
            bytes: 0,
            estimator,
            engine: DecisionEngine::new(&self.config),
            stats: RedStats::default(),
        });
        tracing::debug!(
            now_nanos = now.as_nanos() as u64,
            max_p = self.config.max_p(),
            "Queue disc initialized"
        );
    }

    /// Offers an item to the queue.
    ///
    /// Drops are regular outcomes, not errors. The only error is using the
    /// queue disc before [`initialize`](Self::initialize).
    pub fn enqueue(&mut self, mut item: I) -> Result<EnqueueOutcome, QueueDiscError> {
        let runtime = self
            .runtime
            .as_mut()
            .ok_or(QueueDiscError::NotInitialized)?;
        let mode = self.config.mode;
        let size = item.size();
        let occupancy = runtime.occupancy(mode);

        let needed = match mode {
            QueueMode::Packets => 1,
            QueueMode::Bytes => size as u64,
        };
        if occupancy + needed > self.config.queue_limit as u64 {
            runtime.stats.qlim_drop += 1;
            tracing::debug!(
                occupancy,
                size,
                limit = self.config.queue_limit,
                "Dropping due to queue limit"
            );
            return Ok(EnqueueOutcome::Dropped(DropReason::QueueLimit));
        }

        if let Some(idle_since) = runtime.estimator.idle_since() {
            let idle = self.time_source.now().saturating_sub(idle_since);
            let missed = runtime.estimator.on_idle_end(idle);
            tracing::trace!(idle_nanos = idle.as_nanos() as u64, missed, "Idle period ended");
        }
        let avg = runtime.estimator.sample(occupancy as f64);

        match runtime.engine.decide(avg, occupancy, size, &mut self.rng) {
            Decision::Admit => {}
            Decision::MarkOrDrop => {
                if self.config.use_ecn && item.ecn().is_ect() && item.mark() {
                    runtime.stats.unforced_mark += 1;
                    tracing::trace!(
                        avg,
                        probability = runtime.engine.last_probability(),
                        "Marking congestion"
                    );
                    push(runtime, item, size);
                    return Ok(EnqueueOutcome::Marked);
                }
                runtime.stats.unforced_drop += 1;
                tracing::trace!(
                    avg,
                    probability = runtime.engine.last_probability(),
                    "Early drop"
                );
                return Ok(EnqueueOutcome::Dropped(DropReason::Unforced));
            }
            Decision::ForcedDrop => {
                runtime.stats.forced_drop += 1;
                runtime.engine.on_forced_drop(self.config.ns1_compat);
                tracing::trace!(avg, max_th = self.config.max_th, "Forced drop");
                return Ok(EnqueueOutcome::Dropped(DropReason::Forced));
            }
        }

        runtime.stats.admitted += 1;
        push(runtime, item, size);
        Ok(EnqueueOutcome::Admitted)
    }

    /// Removes the oldest item, or returns `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Result<Option<I>, QueueDiscError> {
        let runtime = self
            .runtime
            .as_mut()
            .ok_or(QueueDiscError::NotInitialized)?;

        let Some(item) = runtime.queue.pop_front() else {
            runtime.estimator.on_idle_start(self.time_source.now());
            return Ok(None);
        };
        runtime.bytes -= item.size() as u64;

        if runtime.queue.is_empty() {
            let now = self.time_source.now();
            runtime.estimator.on_idle_start(now);
            tracing::trace!(now_nanos = now.as_nanos() as u64, "Queue drained");
        }
        Ok(Some(item))
    }

    /// Binds the random source to a fixed stream and returns how many
    /// streams were consumed.
    pub fn assign_streams(&mut self, index: u64) -> u64 {
        self.rng.assign_stream(index)
    }
}

impl<I, R, T> RedQueueDisc<I, R, T> {
    /// Oldest queued item, without removing it.
    pub fn peek(&self) -> Option<&I> {
        self.runtime.as_ref().and_then(|rt| rt.queue.front())
    }

    /// Current occupancy in the configured units.
    pub fn queue_size(&self) -> u64 {
        self.runtime
            .as_ref()
            .map_or(0, |rt| rt.occupancy(self.config.mode))
    }

    /// Number of queued items regardless of the configured units.
    pub fn len(&self) -> usize {
        self.runtime.as_ref().map_or(0, |rt| rt.queue.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue is in an idle period, i.e. drained and not yet
    /// refilled.
    pub fn is_idle(&self) -> bool {
        self.runtime
            .as_ref()
            .map_or(true, |rt| rt.estimator.is_idle())
    }

    pub fn stats(&self) -> RedStats {
        self.runtime
            .as_ref()
            .map(|rt| rt.stats)
            .unwrap_or_default()
    }

    pub fn average_queue_size(&self) -> f64 {
        self.runtime
            .as_ref()
            .map_or(0.0, |rt| rt.estimator.average())
    }

    /// Maximum early-action probability at `max_th`.
    pub fn current_max_p(&self) -> f64 {
        self.runtime
            .as_ref()
            .map_or_else(|| self.config.max_p(), |rt| rt.engine.cur_max_p())
    }

    pub fn config(&self) -> &RedConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }
}

fn push<I>(runtime: &mut Runtime<I>, item: I, size: u32) {
    runtime.bytes += size as u64;
    runtime.queue.push_back(item);
}
