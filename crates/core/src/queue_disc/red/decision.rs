//! Threshold classification and early-drop probability.

use crate::simulation::RandomSource;

use super::config::{QueueMode, RedConfig};

/// Verdict for one arrival, before ECN capability is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Admit,
    /// Probabilistic early action: mark if possible, otherwise drop.
    MarkOrDrop,
    ForcedDrop,
}

/// Maps the average queue size onto the RED probability curve.
///
/// Between `min_th` and `max_th` the base probability grows linearly up to
/// `max_p`. In gentle mode it keeps growing linearly up to 1 at
/// `2 * max_th`; without it everything from `max_th` up is a forced drop.
#[derive(Debug, Clone)]
pub(crate) struct DecisionEngine {
    mode: QueueMode,
    min_th: f64,
    max_th: f64,
    mean_pkt_size: u32,
    gentle: bool,
    wait: bool,
    cur_max_p: f64,
    /// Slope and intercept of the region below `max_th`, before scaling by `cur_max_p`.
    v_a: f64,
    v_b: f64,
    /// Slope and intercept of the gentle region.
    v_c: f64,
    v_d: f64,
    /// Probability used by the last draw.
    v_prob: f64,
    /// Arrivals since the last early action.
    count: u32,
    count_bytes: u32,
    /// Whether the previous arrival was already inside the probabilistic region.
    old: bool,
}

impl DecisionEngine {
    pub(crate) fn new(config: &RedConfig) -> Self {
        let cur_max_p = config.max_p();
        let span = config.max_th - config.min_th;
        Self {
            mode: config.mode,
            min_th: config.min_th,
            max_th: config.max_th,
            mean_pkt_size: config.mean_pkt_size,
            gentle: config.gentle,
            wait: config.wait,
            cur_max_p,
            v_a: 1.0 / span,
            v_b: -config.min_th / span,
            v_c: (1.0 - cur_max_p) / config.max_th,
            v_d: 2.0 * cur_max_p - 1.0,
            v_prob: 0.0,
            count: 0,
            count_bytes: 0,
            old: false,
        }
    }

    /// Classifies one arrival.
    ///
    /// `occupancy` is the queue size before the arrival in mode units and
    /// `size` the arriving item's size in bytes.
    pub(crate) fn decide<R: RandomSource>(
        &mut self,
        avg: f64,
        occupancy: u64,
        size: u32,
        rng: &mut R,
    ) -> Decision {
        self.count = self.count.saturating_add(1);
        self.count_bytes = self.count_bytes.saturating_add(size);

        if !(avg >= self.min_th && occupancy > 1) {
            self.v_prob = 0.0;
            self.old = false;
            return Decision::Admit;
        }

        let forced_from = if self.gentle {
            2.0 * self.max_th
        } else {
            self.max_th
        };
        if avg >= forced_from {
            return Decision::ForcedDrop;
        }

        if !self.old {
            // first arrival inside the region never draws
            self.old = true;
            self.count = 1;
            self.count_bytes = size;
            return Decision::Admit;
        }

        if self.drop_early(avg, size, rng) {
            Decision::MarkOrDrop
        } else {
            Decision::Admit
        }
    }

    /// Forced drops optionally restart the spacing between early actions.
    pub(crate) fn on_forced_drop(&mut self, reset_count: bool) {
        if reset_count {
            self.count = 0;
            self.count_bytes = 0;
        }
    }

    fn drop_early<R: RandomSource>(&mut self, avg: f64, size: u32, rng: &mut R) -> bool {
        let base = self.base_probability(avg);
        self.v_prob = self.spaced_probability(base, size);

        let u = rng.next_uniform();
        tracing::trace!(avg, probability = self.v_prob, draw = u, "Early drop draw");
        // zero probability never acts, even on a draw of exactly 0
        if self.v_prob > 0.0 && u <= self.v_prob {
            self.count = 0;
            self.count_bytes = 0;
            return true;
        }
        false
    }

    fn base_probability(&self, avg: f64) -> f64 {
        let p = if avg >= self.max_th {
            if self.gentle {
                self.v_c * avg + self.v_d
            } else {
                1.0
            }
        } else {
            (self.v_a * avg + self.v_b) * self.cur_max_p
        };
        p.min(1.0)
    }

    /// Spreads early actions evenly instead of letting them cluster.
    fn spaced_probability(&self, mut p: f64, size: u32) -> f64 {
        let count = match self.mode {
            QueueMode::Packets => self.count as f64,
            QueueMode::Bytes => (self.count_bytes / self.mean_pkt_size) as f64,
        };

        let cp = count * p;
        if self.wait {
            p = if cp < 1.0 {
                0.0
            } else if cp < 2.0 {
                p / (2.0 - cp)
            } else {
                1.0
            };
        } else {
            p = if cp < 1.0 { p / (1.0 - cp) } else { 1.0 };
        }

        if self.mode == QueueMode::Bytes && p < 1.0 {
            p = p * size as f64 / self.mean_pkt_size as f64;
        }
        p.min(1.0)
    }

    pub(crate) fn cur_max_p(&self) -> f64 {
        self.cur_max_p
    }

    pub(crate) fn last_probability(&self) -> f64 {
        self.v_prob
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}
