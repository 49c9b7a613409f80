//! Queue discs and the items they hold.

pub mod item;
pub mod red;

pub use item::{EcnCodepoint, IpHeader, Ipv4Header, Ipv6Header, Packet, QueueDiscItem};
pub use red::{
    DropReason, EnqueueOutcome, QueueMode, RedConfig, RedConfigBuilder, RedQueueDisc, RedStats,
    SharedQueueDisc,
};
