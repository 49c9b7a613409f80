//! Clock abstraction for the queue disc.
//!
//! This module provides:
//! - `TimeSource` trait for abstracting the monotonic clock
//! - `RealTime` implementation backed by `std::time::Instant`
//! - `VirtualTime` implementation for deterministic simulation

use std::{
    sync::{
        atomic::{AtomicU64, Ordering as AtomicOrdering},
        Arc,
    },
    time::Duration,
};

/// Abstraction over a monotonic clock supporting both real and virtual time.
///
/// The queue disc only reads the clock to measure how long it stayed idle,
/// so the trait is limited to reading the current instant.
pub trait TimeSource: Send + Sync + Clone + 'static {
    /// Returns the current time as nanoseconds since an arbitrary epoch.
    fn now_nanos(&self) -> u64;

    /// Returns the current time as a Duration since an arbitrary epoch.
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_nanos())
    }
}

/// Wall-clock time measured from the moment this source was created.
#[derive(Clone)]
pub struct RealTime {
    epoch: std::time::Instant,
}

impl Default for RealTime {
    fn default() -> Self {
        Self::new()
    }
}

impl RealTime {
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl TimeSource for RealTime {
    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Virtual time for deterministic simulation.
///
/// Time only advances when explicitly stepped via `advance()` or `advance_to()`.
/// Clones share the same underlying clock, so the caller driving the event
/// sequence and the queue disc observe identical instants.
#[derive(Clone, Debug)]
pub struct VirtualTime {
    current_nanos: Arc<AtomicU64>,
}

impl Default for VirtualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTime {
    /// Creates a new virtual time starting at 0.
    pub fn new() -> Self {
        Self::with_initial_time(0)
    }

    /// Creates a new virtual time starting at the given nanoseconds.
    pub fn with_initial_time(initial_nanos: u64) -> Self {
        Self {
            current_nanos: Arc::new(AtomicU64::new(initial_nanos)),
        }
    }

    /// Advances time by the given duration.
    pub fn advance(&self, duration: Duration) {
        let new_time = self
            .current_nanos
            .load(AtomicOrdering::SeqCst)
            .saturating_add(duration.as_nanos() as u64);
        self.advance_to(new_time);
    }

    /// Advances time to the given absolute nanoseconds.
    ///
    /// Moving backwards is ignored; the clock is monotonic.
    pub fn advance_to(&self, target_nanos: u64) {
        self.current_nanos
            .fetch_max(target_nanos, AtomicOrdering::SeqCst);
    }
}

impl TimeSource for VirtualTime {
    fn now_nanos(&self) -> u64 {
        self.current_nanos.load(AtomicOrdering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_time_starts_at_zero() {
        let vt = VirtualTime::new();
        assert_eq!(vt.now_nanos(), 0);
    }

    #[test]
    fn test_virtual_time_advance() {
        let vt = VirtualTime::new();
        vt.advance(Duration::from_secs(10));
        assert_eq!(vt.now_nanos(), 10_000_000_000);
        assert_eq!(vt.now(), Duration::from_secs(10));
    }

    #[test]
    fn test_virtual_time_is_monotonic() {
        let vt = VirtualTime::with_initial_time(500);
        vt.advance_to(100);
        assert_eq!(vt.now_nanos(), 500);
        vt.advance_to(700);
        assert_eq!(vt.now_nanos(), 700);
    }

    #[test]
    fn test_virtual_time_clones_share_clock() {
        let vt = VirtualTime::new();
        let observer = vt.clone();
        vt.advance(Duration::from_millis(3));
        assert_eq!(observer.now(), Duration::from_millis(3));
    }

    #[test]
    fn test_real_time_basic() {
        let rt = RealTime::new();
        let t1 = rt.now_nanos();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = rt.now_nanos();
        assert!(t2 > t1);
        assert!(t2 - t1 >= 10_000_000);
    }
}
