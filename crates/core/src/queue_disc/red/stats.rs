//! RED outcome counters.

use std::fmt;

/// Snapshot of the outcome counters of one queue disc.
///
/// Every enqueue attempt lands in exactly one counter, so the counters always
/// sum to [`total_enqueue_attempts`](Self::total_enqueue_attempts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedStats {
    /// Early actions resolved by marking an ECN-capable item.
    pub unforced_mark: u64,
    /// Early actions resolved by dropping.
    pub unforced_drop: u64,
    /// Drops because the average reached the forced region.
    pub forced_drop: u64,
    /// Drops because the hard limit would have been exceeded.
    pub qlim_drop: u64,
    /// Items admitted without a mark.
    pub admitted: u64,
}

impl RedStats {
    pub fn total_enqueue_attempts(&self) -> u64 {
        self.unforced_mark + self.unforced_drop + self.forced_drop + self.qlim_drop + self.admitted
    }

    pub fn total_drops(&self) -> u64 {
        self.unforced_drop + self.forced_drop + self.qlim_drop
    }
}

impl fmt::Display for RedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempts={} admitted={} unforced_mark={} unforced_drop={} forced_drop={} qlim_drop={}",
            self.total_enqueue_attempts(),
            self.admitted,
            self.unforced_mark,
            self.unforced_drop,
            self.forced_drop,
            self.qlim_drop
        )
    }
}
