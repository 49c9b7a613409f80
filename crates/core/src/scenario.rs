//! Scripted traffic runs over a single queue disc.
//!
//! A scenario fixes everything a run depends on (queue configuration, random
//! stream, arrival pattern) so that the same file always produces the same
//! statistics. Time is virtual: arrivals are spaced by advancing a
//! [`VirtualTime`] clock, never by sleeping.
//!
//! ```toml
//! [queue]
//! min_th = 70.0
//! max_th = 150.0
//! queue_limit = 300
//! queue_weight = 0.02
//!
//! [rng]
//! seed = 1
//! run = 17
//! stream = 1
//!
//! [traffic]
//! packets = 300
//! payload_size = 1000
//! ecn_capable = true
//! ```

use std::{fmt, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::config::RedConfig;
use crate::errors::{ConfigError, QueueDiscError};
use crate::queue_disc::{
    EcnCodepoint, EnqueueOutcome, Packet, QueueDiscItem, RedQueueDisc, RedStats,
};
use crate::simulation::{RandomSource, SeedManager, TimeSource, VirtualTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

/// Which MRG32k3a stream drives the queue disc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub seed: u32,
    pub run: u64,
    /// Explicit stream index. Without one the first automatic stream is used.
    pub stream: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            run: 1,
            stream: None,
        }
    }
}

/// Arrival pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Number of arrivals.
    pub packets: u64,
    /// IP payload per packet in bytes.
    pub payload_size: u32,
    /// Send ECT(0) instead of Not-ECT.
    pub ecn_capable: bool,
    pub ip_version: IpVersion,
    /// Dequeue one packet after every `n` arrivals; 0 never dequeues.
    pub dequeue_every: u64,
    /// Virtual time between two arrivals, in microseconds.
    pub inter_arrival_us: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            packets: 300,
            payload_size: 1000,
            ecn_capable: true,
            ip_version: IpVersion::V4,
            dequeue_every: 0,
            inter_arrival_us: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub queue: RedConfig,
    pub rng: StreamConfig,
    pub traffic: TrafficConfig,
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()?;
        SeedManager::new(self.rng.seed, self.rng.run)?;
        Ok(())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = toml::from_str(raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    fn packet(&self, uid: u64) -> Packet {
        let ecn = if self.traffic.ecn_capable {
            EcnCodepoint::Ect0
        } else {
            EcnCodepoint::NotEct
        };
        match self.traffic.ip_version {
            IpVersion::V4 => Packet::ipv4(uid, self.traffic.payload_size, ecn),
            IpVersion::V6 => Packet::ipv6(uid, self.traffic.payload_size, ecn),
        }
    }
}

/// Outcome of [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub stats: RedStats,
    /// Packets handed out by dequeues during the run.
    pub delivered: u64,
    /// Delivered packets carrying CE.
    pub delivered_ce: u64,
    /// Occupancy at the end of the run, in queue units.
    pub queue_size: u64,
    pub average_queue_size: f64,
    pub elapsed: Duration,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delivered={} delivered_ce={} queue_size={} avg={:.3} elapsed={:?}",
            self.stats,
            self.delivered,
            self.delivered_ce,
            self.queue_size,
            self.average_queue_size,
            self.elapsed
        )
    }
}

/// Drives one queue disc through the scenario.
pub fn run(scenario: &Scenario) -> Result<ScenarioReport, QueueDiscError> {
    scenario.validate()?;
    let seeds = SeedManager::new(scenario.rng.seed, scenario.rng.run).map_err(ConfigError::from)?;
    let mut stream = seeds.next_stream();
    if let Some(index) = scenario.rng.stream {
        stream.assign_stream(index);
    }

    let time = VirtualTime::new();
    let mut disc = RedQueueDisc::new(scenario.queue.clone(), stream, time.clone())?;
    disc.initialize();

    let traffic = &scenario.traffic;
    let mut delivered = 0;
    let mut delivered_ce = 0;
    for uid in 0..traffic.packets {
        if uid > 0 {
            time.advance(Duration::from_micros(traffic.inter_arrival_us));
        }
        let outcome = disc.enqueue(scenario.packet(uid))?;
        if outcome != EnqueueOutcome::Admitted {
            tracing::trace!(uid, ?outcome, "Arrival not admitted unchanged");
        }

        if traffic.dequeue_every > 0 && (uid + 1) % traffic.dequeue_every == 0 {
            if let Some(packet) = disc.dequeue()? {
                delivered += 1;
                if packet.ecn() == EcnCodepoint::Ce {
                    delivered_ce += 1;
                }
            }
        }
    }

    let report = ScenarioReport {
        stats: disc.stats(),
        delivered,
        delivered_ce,
        queue_size: disc.queue_size(),
        average_queue_size: disc.average_queue_size(),
        elapsed: time.now(),
    };
    tracing::info!(
        seed = scenario.rng.seed,
        run = scenario.rng.run,
        stream = ?scenario.rng.stream,
        mode = %scenario.queue.mode,
        "Scenario finished: {report}"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_defaults_without_sections() -> TestResult {
        let scenario = Scenario::from_toml_str("")?;
        assert_eq!(scenario, Scenario::default());
        assert_eq!(scenario.traffic.packets, 300);
        Ok(())
    }

    #[test]
    fn test_invalid_seed_rejected() {
        let err = Scenario::from_toml_str("[rng]\nseed = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Seed(_)));
    }

    #[test_log::test]
    fn test_marking_run() -> TestResult {
        let scenario = Scenario::from_toml_str(
            r#"
            [queue]
            min_th = 70.0
            max_th = 150.0
            queue_limit = 300
            queue_weight = 0.02

            [rng]
            seed = 1
            run = 17
            stream = 1
            "#,
        )?;
        let report = run(&scenario)?;
        assert_eq!(report.stats.unforced_mark, 27);
        assert_eq!(report.stats.unforced_drop, 0);
        assert_eq!(report.stats.forced_drop, 0);
        assert_eq!(report.queue_size, 300);
        assert_eq!(report.delivered, 0);
        Ok(())
    }

    #[test]
    fn test_paced_run_delivers() -> TestResult {
        let mut scenario = Scenario::default();
        scenario.traffic.packets = 100;
        scenario.traffic.dequeue_every = 1;
        scenario.traffic.inter_arrival_us = 1000;
        let report = run(&scenario)?;
        assert_eq!(report.delivered, 100);
        assert_eq!(report.queue_size, 0);
        assert_eq!(report.stats.admitted, 100);
        assert_eq!(report.elapsed, Duration::from_millis(99));
        Ok(())
    }

    #[test]
    fn test_ipv6_packets_are_larger() {
        let mut scenario = Scenario::default();
        scenario.traffic.ip_version = IpVersion::V6;
        assert_eq!(scenario.packet(0).size(), 1040);
        scenario.traffic.ip_version = IpVersion::V4;
        assert_eq!(scenario.packet(0).size(), 1020);
    }
}
