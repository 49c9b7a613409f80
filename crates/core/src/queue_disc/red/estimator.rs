//! Average queue length estimation.
//!
//! The average is an EWMA of the occupancy observed at every arrival. While
//! the queue sits empty no arrivals are sampled, so on the first arrival after
//! an idle period the estimator decays the average as if `m` empty samples had
//! been taken, `m` being the number of mean-sized packets the link could have
//! sent in the meantime.

use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct AverageQueueEstimator {
    weight: f64,
    /// Link rate in mean-sized packets per second.
    packet_time_constant: f64,
    avg: f64,
    idle_since: Option<Duration>,
    pending_missed: u64,
}

impl AverageQueueEstimator {
    pub(crate) fn new(weight: f64, packet_time_constant: f64) -> Self {
        Self {
            weight,
            packet_time_constant,
            avg: 0.0,
            idle_since: None,
            pending_missed: 0,
        }
    }

    /// Clears the average and starts an idle period at `now`.
    pub(crate) fn reset(&mut self, now: Duration) {
        self.avg = 0.0;
        self.pending_missed = 0;
        self.idle_since = Some(now);
    }

    /// The queue just drained. An already running idle period keeps its start.
    pub(crate) fn on_idle_start(&mut self, now: Duration) {
        if self.idle_since.is_none() {
            self.idle_since = Some(now);
        }
    }

    /// Ends the idle period and returns the number of samples it missed.
    ///
    /// The missed samples are folded in by the next [`sample`](Self::sample).
    pub(crate) fn on_idle_end(&mut self, idle: Duration) -> u64 {
        self.idle_since = None;
        // float to int casts saturate
        let missed = (self.packet_time_constant * idle.as_secs_f64()) as u64;
        self.pending_missed = missed;
        missed
    }

    pub(crate) fn idle_since(&self) -> Option<Duration> {
        self.idle_since
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.idle_since.is_some()
    }

    /// Folds one occupancy sample (mode units) into the average.
    pub(crate) fn sample(&mut self, occupancy: f64) -> f64 {
        let missed = std::mem::take(&mut self.pending_missed);
        let decay = (1.0 - self.weight).powf(missed as f64 + 1.0);
        self.avg = self.avg * decay + self.weight * occupancy;
        self.avg
    }

    pub(crate) fn average(&self) -> f64 {
        self.avg
    }
}
