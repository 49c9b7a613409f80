//! Items held by a queue disc.
//!
//! The queue disc only needs three things from an item: its size on the wire,
//! its current ECN codepoint and a way to flag congestion on it. IPv4 and IPv6
//! carry the codepoint in different header fields, so marking is implemented
//! per header variant behind [`QueueDiscItem::mark`].

use std::fmt;

/// Size of an IPv4 header without options.
pub const IPV4_HEADER_SIZE: u32 = 20;

/// Size of the fixed IPv6 header.
pub const IPV6_HEADER_SIZE: u32 = 40;

const ECN_MASK: u8 = 0b11;

/// The two ECN bits of the IPv4 TOS byte or the IPv6 traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EcnCodepoint {
    /// Not ECN-capable transport.
    #[default]
    NotEct = 0b00,
    Ect1 = 0b01,
    Ect0 = 0b10,
    /// Congestion experienced.
    Ce = 0b11,
}

impl EcnCodepoint {
    /// Decodes the two low bits of a TOS or traffic class byte.
    pub fn from_bits(byte: u8) -> Self {
        match byte & ECN_MASK {
            0b00 => EcnCodepoint::NotEct,
            0b01 => EcnCodepoint::Ect1,
            0b10 => EcnCodepoint::Ect0,
            _ => EcnCodepoint::Ce,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the sender advertised ECN capability.
    pub fn is_ect(self) -> bool {
        matches!(self, EcnCodepoint::Ect0 | EcnCodepoint::Ect1)
    }
}

impl fmt::Display for EcnCodepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EcnCodepoint::NotEct => "Not-ECT",
            EcnCodepoint::Ect1 => "ECT(1)",
            EcnCodepoint::Ect0 => "ECT(0)",
            EcnCodepoint::Ce => "CE",
        };
        f.write_str(name)
    }
}

/// Anything a queue disc can hold.
pub trait QueueDiscItem {
    /// Size in bytes, headers included.
    fn size(&self) -> u32;

    fn ecn(&self) -> EcnCodepoint;

    /// Rewrites the codepoint to CE.
    ///
    /// Returns `false` and leaves the item untouched unless it carries
    /// ECT(0) or ECT(1).
    fn mark(&mut self) -> bool;
}

/// IPv4 header fields relevant to queueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ipv4Header {
    tos: u8,
}

impl Ipv4Header {
    pub fn new(tos: u8) -> Self {
        Self { tos }
    }

    pub fn with_ecn(ecn: EcnCodepoint) -> Self {
        Self { tos: ecn.bits() }
    }

    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Differentiated services code point (upper six TOS bits).
    pub fn dscp(&self) -> u8 {
        self.tos >> 2
    }

    pub fn ecn(&self) -> EcnCodepoint {
        EcnCodepoint::from_bits(self.tos)
    }

    pub fn set_ecn(&mut self, ecn: EcnCodepoint) {
        self.tos = (self.tos & !ECN_MASK) | ecn.bits();
    }
}

/// IPv6 header fields relevant to queueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ipv6Header {
    traffic_class: u8,
}

impl Ipv6Header {
    pub fn new(traffic_class: u8) -> Self {
        Self { traffic_class }
    }

    pub fn with_ecn(ecn: EcnCodepoint) -> Self {
        Self {
            traffic_class: ecn.bits(),
        }
    }

    pub fn traffic_class(&self) -> u8 {
        self.traffic_class
    }

    pub fn ecn(&self) -> EcnCodepoint {
        EcnCodepoint::from_bits(self.traffic_class)
    }

    pub fn set_ecn(&mut self, ecn: EcnCodepoint) {
        self.traffic_class = (self.traffic_class & !ECN_MASK) | ecn.bits();
    }
}

/// Network header of a [`Packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpHeader {
    V4(Ipv4Header),
    V6(Ipv6Header),
}

impl IpHeader {
    pub fn serialized_size(&self) -> u32 {
        match self {
            IpHeader::V4(_) => IPV4_HEADER_SIZE,
            IpHeader::V6(_) => IPV6_HEADER_SIZE,
        }
    }

    pub fn ecn(&self) -> EcnCodepoint {
        match self {
            IpHeader::V4(h) => h.ecn(),
            IpHeader::V6(h) => h.ecn(),
        }
    }

    pub fn set_ecn(&mut self, ecn: EcnCodepoint) {
        match self {
            IpHeader::V4(h) => h.set_ecn(ecn),
            IpHeader::V6(h) => h.set_ecn(ecn),
        }
    }
}

/// An IP packet: a header plus an opaque payload of known length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    uid: u64,
    payload_len: u32,
    header: IpHeader,
}

impl Packet {
    pub fn new(uid: u64, payload_len: u32, header: IpHeader) -> Self {
        Self {
            uid,
            payload_len,
            header,
        }
    }

    pub fn ipv4(uid: u64, payload_len: u32, ecn: EcnCodepoint) -> Self {
        Self::new(uid, payload_len, IpHeader::V4(Ipv4Header::with_ecn(ecn)))
    }

    pub fn ipv6(uid: u64, payload_len: u32, ecn: EcnCodepoint) -> Self {
        Self::new(uid, payload_len, IpHeader::V6(Ipv6Header::with_ecn(ecn)))
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    pub fn header(&self) -> &IpHeader {
        &self.header
    }
}

impl QueueDiscItem for Packet {
    fn size(&self) -> u32 {
        self.payload_len + self.header.serialized_size()
    }

    fn ecn(&self) -> EcnCodepoint {
        self.header.ecn()
    }

    fn mark(&mut self) -> bool {
        if !self.header.ecn().is_ect() {
            return false;
        }
        self.header.set_ecn(EcnCodepoint::Ce);
        true
    }
}
