//! RED configuration and constants.
//!
//! This module contains the configuration struct, its validation rules and
//! the tuning defaults of the RED queue disc.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default lower threshold (mode units).
pub(crate) const DEFAULT_MIN_TH: f64 = 5.0;

/// Default upper threshold (mode units).
pub(crate) const DEFAULT_MAX_TH: f64 = 15.0;

/// Default hard admission ceiling (mode units).
pub(crate) const DEFAULT_QUEUE_LIMIT: u32 = 25;

/// Default EWMA weight.
pub(crate) const DEFAULT_QUEUE_WEIGHT: f64 = 0.002;

/// Default average packet size in bytes.
pub(crate) const DEFAULT_MEAN_PKT_SIZE: u32 = 500;

/// Default inverse of the maximum marking probability (maxP = 1/50).
pub(crate) const DEFAULT_L_INTERM: f64 = 50.0;

/// Default bottleneck rate: 1.5 Mbit/s.
pub(crate) const DEFAULT_LINK_BANDWIDTH_BPS: u64 = 1_500_000;

/// Unit system shared by the thresholds, the limit and the occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Thresholds count packets.
    #[default]
    Packets,
    /// Thresholds count bytes.
    Bytes,
}

impl std::fmt::Display for QueueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueMode::Packets => write!(f, "packets"),
            QueueMode::Bytes => write!(f, "bytes"),
        }
    }
}

/// Configuration for a RED queue disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedConfig {
    /// Unit system for `min_th`, `max_th` and `queue_limit`.
    pub mode: QueueMode,
    /// Average occupancy at which probabilistic marking starts.
    pub min_th: f64,
    /// Upper edge of the linear probability region.
    pub max_th: f64,
    /// Hard admission ceiling.
    pub queue_limit: u32,
    /// EWMA weight, in (0, 1].
    pub queue_weight: f64,
    /// Average packet size in bytes.
    ///
    /// Normalizes the inter-mark counter in byte mode and converts the link
    /// bandwidth into packets per second for idle compensation.
    pub mean_pkt_size: u32,
    /// Mark ECN-capable packets instead of dropping them in the unforced region.
    pub use_ecn: bool,
    /// Probability ramps from maxP to 1 between `max_th` and `2 * max_th`
    /// instead of jumping straight to forced drops at `max_th`.
    pub gentle: bool,
    /// Space marks further apart: no mark is taken while `count * pb < 1`.
    pub wait: bool,
    /// Inverse of the maximum marking probability at `max_th`.
    pub l_interm: f64,
    /// Bottleneck link rate in bits per second.
    pub link_bandwidth_bps: u64,
    /// Forced drops also reset the inter-mark counter.
    pub ns1_compat: bool,
}

impl Default for RedConfig {
    fn default() -> Self {
        Self {
            mode: QueueMode::Packets,
            min_th: DEFAULT_MIN_TH,
            max_th: DEFAULT_MAX_TH,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            queue_weight: DEFAULT_QUEUE_WEIGHT,
            mean_pkt_size: DEFAULT_MEAN_PKT_SIZE,
            use_ecn: true,
            gentle: true,
            wait: true,
            l_interm: DEFAULT_L_INTERM,
            link_bandwidth_bps: DEFAULT_LINK_BANDWIDTH_BPS,
            ns1_compat: false,
        }
    }
}

impl RedConfig {
    pub fn builder() -> RedConfigBuilder {
        RedConfigBuilder::default()
    }

    /// Check every invariant. Nothing is mutated on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_th > 0.0) {
            return Err(ConfigError::NonPositiveMinThreshold(self.min_th));
        }
        if !(self.min_th < self.max_th) {
            return Err(ConfigError::ThresholdOrder {
                min: self.min_th,
                max: self.max_th,
            });
        }
        if (self.queue_limit as f64) < self.max_th {
            return Err(ConfigError::QueueLimitBelowMaxThreshold {
                limit: self.queue_limit,
                max_th: self.max_th,
            });
        }
        if !(self.queue_weight > 0.0 && self.queue_weight <= 1.0) {
            return Err(ConfigError::QueueWeightOutOfRange(self.queue_weight));
        }
        if self.mean_pkt_size == 0 {
            return Err(ConfigError::ZeroMeanPacketSize);
        }
        if !(self.l_interm >= 1.0) {
            return Err(ConfigError::InvalidMaxProbabilityDivisor(self.l_interm));
        }
        if self.link_bandwidth_bps == 0 {
            return Err(ConfigError::ZeroLinkBandwidth);
        }
        Ok(())
    }

    /// Maximum marking probability reached at `max_th`.
    pub fn max_p(&self) -> f64 {
        1.0 / self.l_interm
    }

    /// Link rate expressed in mean-sized packets per second.
    pub(crate) fn packet_time_constant(&self) -> f64 {
        self.link_bandwidth_bps as f64 / (8.0 * self.mean_pkt_size as f64)
    }
}

/// Fluent construction of a validated [`RedConfig`].
#[derive(Debug, Clone, Default)]
pub struct RedConfigBuilder {
    config: RedConfig,
}

impl RedConfigBuilder {
    pub fn mode(mut self, mode: QueueMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn thresholds(mut self, min_th: f64, max_th: f64) -> Self {
        self.config.min_th = min_th;
        self.config.max_th = max_th;
        self
    }

    pub fn queue_limit(mut self, limit: u32) -> Self {
        self.config.queue_limit = limit;
        self
    }

    pub fn queue_weight(mut self, weight: f64) -> Self {
        self.config.queue_weight = weight;
        self
    }

    pub fn mean_pkt_size(mut self, bytes: u32) -> Self {
        self.config.mean_pkt_size = bytes;
        self
    }

    pub fn use_ecn(mut self, enabled: bool) -> Self {
        self.config.use_ecn = enabled;
        self
    }

    pub fn gentle(mut self, enabled: bool) -> Self {
        self.config.gentle = enabled;
        self
    }

    pub fn wait(mut self, enabled: bool) -> Self {
        self.config.wait = enabled;
        self
    }

    pub fn l_interm(mut self, l_interm: f64) -> Self {
        self.config.l_interm = l_interm;
        self
    }

    pub fn link_bandwidth_bps(mut self, bps: u64) -> Self {
        self.config.link_bandwidth_bps = bps;
        self
    }

    pub fn ns1_compat(mut self, enabled: bool) -> Self {
        self.config.ns1_compat = enabled;
        self
    }

    pub fn build(self) -> Result<RedConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
