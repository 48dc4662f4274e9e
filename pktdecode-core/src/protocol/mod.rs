//! Protocol decoding framework.
//!
//! This module provides:
//! - [`ProtocolTag`], the closed set of protocols the decoder understands
//! - [`Protocol`] trait implemented by every layer parser
//! - [`ProtocolRegistry`] mapping tags to lazily created parsers
//! - [`LayerRecord`] and [`FieldValue`] describing one decoded header
//!
//! ## Supported Protocols
//!
//! | Layer | Protocols | Next protocol from |
//! |-------|-----------|--------------------|
//! | Link | Ethernet II | `ethertype` |
//! | Network | ARP, IPv4, IPv6 | `protocol` / `next_header` |
//! | Transport | TCP, UDP, ICMP | terminal |
//!
//! ## Example
//!
//! ```rust
//! use pktdecode_core::protocol::{default_registry, Protocol, ProtocolTag};
//!
//! let registry = default_registry();
//! let ethernet = registry.get(ProtocolTag::Ethernet).unwrap();
//!
//! let frame: &[u8] = &[
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff,  // dst mac
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55,  // src mac
//!     0x08, 0x06,                          // ethertype (ARP)
//! ];
//!
//! assert!(ethernet.can_decode(frame, 0));
//! let record = ethernet.decode(frame, 0).unwrap();
//! assert_eq!(ethernet.next_protocol(&record), Some(ProtocolTag::Arp));
//! ```

mod field;
mod record;
mod registry;

// Protocol implementations
mod arp;
mod ethernet;
mod icmp;
mod ipv4;
mod ipv6;
mod tcp;
mod udp;

// Test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;

pub use field::{FieldValue, FlagSet};
pub use record::{FieldEntry, LayerRecord};
pub use registry::{BuiltinProtocol, ParserFactory, Protocol, ProtocolRegistry};

// Re-export protocol implementations
pub use arp::ArpProtocol;
pub use ethernet::EthernetProtocol;
pub use icmp::IcmpProtocol;
pub use ipv4::Ipv4Protocol;
pub use ipv6::Ipv6Protocol;
pub use tcp::TcpProtocol;
pub use udp::UdpProtocol;

// Re-export protocol constants
pub use arp::operation as arp_operation;
pub use ethernet::ethertype;
pub use icmp::icmp_type;
pub use ipv4::ip_protocol;
pub use tcp::flags as tcp_flags;

use crate::error::DecodeError;

/// The closed set of protocols the decode chain can visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolTag {
    Ethernet,
    Arp,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Icmp,
}

impl ProtocolTag {
    /// Number of tags.
    pub const COUNT: usize = 7;

    /// Every tag in chain order.
    pub const ALL: [ProtocolTag; Self::COUNT] = [
        ProtocolTag::Ethernet,
        ProtocolTag::Arp,
        ProtocolTag::Ipv4,
        ProtocolTag::Ipv6,
        ProtocolTag::Tcp,
        ProtocolTag::Udp,
        ProtocolTag::Icmp,
    ];

    /// Display name, also used as the persisted `protocol` column.
    pub fn name(self) -> &'static str {
        match self {
            ProtocolTag::Ethernet => "Ethernet",
            ProtocolTag::Arp => "ARP",
            ProtocolTag::Ipv4 => "IPv4",
            ProtocolTag::Ipv6 => "IPv6",
            ProtocolTag::Tcp => "TCP",
            ProtocolTag::Udp => "UDP",
            ProtocolTag::Icmp => "ICMP",
        }
    }

    /// Position in the chain counted from the link layer (Ethernet = 1).
    pub fn layer(self) -> u8 {
        match self {
            ProtocolTag::Ethernet => 1,
            ProtocolTag::Arp | ProtocolTag::Ipv4 | ProtocolTag::Ipv6 => 2,
            ProtocolTag::Tcp | ProtocolTag::Udp | ProtocolTag::Icmp => 3,
        }
    }

    /// One-line description of the protocol.
    pub fn description(self) -> &'static str {
        match self {
            ProtocolTag::Ethernet => "Ethernet II frame (IEEE 802.3)",
            ProtocolTag::Arp => "Address Resolution Protocol (RFC 826)",
            ProtocolTag::Ipv4 => "Internet Protocol version 4 (RFC 791)",
            ProtocolTag::Ipv6 => "Internet Protocol version 6 (RFC 8200)",
            ProtocolTag::Tcp => "Transmission Control Protocol (RFC 9293)",
            ProtocolTag::Udp => "User Datagram Protocol (RFC 768)",
            ProtocolTag::Icmp => "Internet Control Message Protocol (RFC 792)",
        }
    }

    /// Dense index, used by the registry's slot table.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ProtocolTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Registry holding all seven layer parsers, none yet instantiated.
pub fn default_registry() -> ProtocolRegistry {
    let mut registry = ProtocolRegistry::new();

    // Layer 2
    registry.register(ProtocolTag::Ethernet, || EthernetProtocol.into());
    registry.register(ProtocolTag::Arp, || ArpProtocol.into());

    // Layer 3
    registry.register(ProtocolTag::Ipv4, || Ipv4Protocol.into());
    registry.register(ProtocolTag::Ipv6, || Ipv6Protocol.into());

    // Layer 4
    registry.register(ProtocolTag::Tcp, || TcpProtocol.into());
    registry.register(ProtocolTag::Udp, || UdpProtocol.into());
    registry.register(ProtocolTag::Icmp, || IcmpProtocol.into());

    registry
}

/// Bytes available from `offset` to the end of `data`.
#[inline]
pub(crate) fn available(data: &[u8], offset: usize) -> usize {
    data.len().saturating_sub(offset)
}

/// Slice `needed` bytes starting at `offset`, or report how short the buffer is.
#[inline]
pub(crate) fn header_window<'a>(
    data: &'a [u8],
    offset: usize,
    needed: usize,
    protocol: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let have = available(data, offset);
    if have < needed {
        return Err(DecodeError::InsufficientData {
            protocol,
            needed,
            have,
        });
    }
    Ok(&data[offset..offset + needed])
}

/// Copy `N` bytes out of a window already checked to be long enough.
#[inline]
pub(crate) fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
