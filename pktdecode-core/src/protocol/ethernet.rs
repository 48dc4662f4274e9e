//! Ethernet II protocol parser.

use compact_str::format_compact;
use etherparse::Ethernet2HeaderSlice;

use super::{header_window, FieldValue, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// Ethernet II header length.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Well-known EtherType values (IEEE 802).
#[allow(dead_code)]
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
    pub const MPLS: u16 = 0x8847;
    pub const MPLS_MULTICAST: u16 = 0x8848;
    pub const LLDP: u16 = 0x88CC;
}

/// Name of an EtherType, or `None` if it is not in the table.
pub fn ethertype_name(value: u16) -> Option<&'static str> {
    match value {
        ethertype::IPV4 => Some("IPv4"),
        ethertype::ARP => Some("ARP"),
        ethertype::VLAN => Some("VLAN"),
        ethertype::IPV6 => Some("IPv6"),
        ethertype::MPLS => Some("MPLS Unicast"),
        ethertype::MPLS_MULTICAST => Some("MPLS Multicast"),
        ethertype::LLDP => Some("LLDP"),
        _ => None,
    }
}

/// Ethernet II protocol parser.
#[derive(Debug, Clone, Copy)]
pub struct EthernetProtocol;

impl Protocol for EthernetProtocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Ethernet
    }

    fn min_header_len(&self) -> usize {
        ETHERNET_HEADER_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let window = header_window(data, offset, ETHERNET_HEADER_LEN, "Ethernet")?;
        let eth = Ethernet2HeaderSlice::from_slice(window)
            .map_err(|e| DecodeError::malformed("Ethernet", "header", e.to_string()))?;

        let ether_type = eth.ether_type().0;

        let mut record = LayerRecord::new(ProtocolTag::Ethernet, offset, ETHERNET_HEADER_LEN);
        record.push("dst_mac", FieldValue::mac(eth.destination()));
        record.push("src_mac", FieldValue::mac(eth.source()));
        record.push("ethertype", FieldValue::UInt16(ether_type));
        record.push(
            "ethertype_name",
            match ethertype_name(ether_type) {
                Some(name) => FieldValue::Str(name),
                None => FieldValue::Text(format_compact!("Unknown (0x{ether_type:04x})")),
            },
        );

        Ok(record)
    }

    fn next_protocol(&self, record: &LayerRecord) -> Option<ProtocolTag> {
        match record.get_u16("ethertype")? {
            ethertype::IPV4 => Some(ProtocolTag::Ipv4),
            ethertype::IPV6 => Some(ProtocolTag::Ipv6),
            ethertype::ARP => Some(ProtocolTag::Arp),
            _ => None,
        }
    }
}
