//! Random Early Detection (RED) active queue management with ECN.
//!
//! Implementation of the RED gateway of Floyd and Jacobson ("Random Early
//! Detection Gateways for Congestion Avoidance", 1993) together with the
//! "gentle" extension and ECN marking (RFC 3168).
//!
//! ## How it works
//!
//! Every arrival updates an exponentially weighted average of the queue
//! occupancy. The average, not the instantaneous queue, decides the fate of
//! the arrival:
//!
//! | average | outcome |
//! |---------|---------|
//! | below `min_th` | admit |
//! | `min_th` .. `max_th` | mark or drop with probability rising to `maxP` |
//! | `max_th` .. `2*max_th` (gentle) | mark or drop with probability rising to 1 |
//! | above the forced threshold | drop |
//!
//! The probability of an early action grows with the number of arrivals since
//! the previous one, spacing actions evenly instead of in bursts. Early
//! actions on ECN-capable items set the CE codepoint and keep the item;
//! forced drops never mark.
//!
//! Independently of the average, an arrival that would push the queue over
//! its hard limit is dropped before any of the above runs.
//!
//! ## Reproducibility
//!
//! The random source and the clock are injected. With an MRG32k3a stream
//! bound to a fixed (seed, run, stream) triple and a `VirtualTime` clock, a
//! given arrival sequence always yields the same marks and drops.

mod config;
mod controller;
mod decision;
mod estimator;
mod stats;


pub use config::{QueueMode, RedConfig, RedConfigBuilder};
pub use controller::{DropReason, EnqueueOutcome, RedQueueDisc, SharedQueueDisc};
pub use stats::RedStats;
