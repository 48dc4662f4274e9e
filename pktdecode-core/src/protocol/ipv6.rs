//! IPv6 protocol parser.

use compact_str::format_compact;
use etherparse::Ipv6HeaderSlice;

use super::ipv4::ip_protocol;
use super::{available, header_window, FieldValue, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// Fixed IPv6 header length.
pub const IPV6_HEADER_LEN: usize = 40;

/// IPv6 next-header values that are not plain IP protocol numbers.
#[allow(dead_code)]
pub mod next_header {
    pub const HOP_BY_HOP: u8 = 0;
    pub const ROUTING: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const NO_NEXT_HEADER: u8 = 59;
    pub const DESTINATION_OPTIONS: u8 = 60;
}

fn next_header_name(value: u8) -> Option<&'static str> {
    Some(match value {
        next_header::HOP_BY_HOP => "Hop-by-Hop Options",
        ip_protocol::TCP => "TCP",
        ip_protocol::UDP => "UDP",
        next_header::ROUTING => "Routing Header",
        next_header::FRAGMENT => "Fragment Header",
        ip_protocol::ESP => "ESP",
        ip_protocol::AH => "Authentication Header",
        ip_protocol::ICMPV6 => "ICMPv6",
        next_header::NO_NEXT_HEADER => "No Next Header",
        next_header::DESTINATION_OPTIONS => "Destination Options",
        _ => return None,
    })
}

/// IPv6 protocol parser.
///
/// Extension headers are not walked: anything other than TCP or UDP
/// directly after the fixed header ends the chain.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Protocol;

impl Protocol for Ipv6Protocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Ipv6
    }

    fn min_header_len(&self) -> usize {
        IPV6_HEADER_LEN
    }

    fn can_decode(&self, data: &[u8], offset: usize) -> bool {
        available(data, offset) >= IPV6_HEADER_LEN && data[offset] >> 4 == 6
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let window = header_window(data, offset, IPV6_HEADER_LEN, "IPv6")?;
        let ipv6 = Ipv6HeaderSlice::from_slice(window)
            .map_err(|e| DecodeError::malformed("IPv6", "header", e.to_string()))?;

        let next = ipv6.next_header().0;

        let mut record = LayerRecord::new(ProtocolTag::Ipv6, offset, IPV6_HEADER_LEN);
        record.push("version", FieldValue::UInt8(ipv6.version()));
        record.push("traffic_class", FieldValue::UInt8(ipv6.traffic_class()));
        record.push("flow_label", FieldValue::UInt32(ipv6.flow_label().value()));
        record.push("payload_length", FieldValue::UInt16(ipv6.payload_length()));
        record.push("next_header", FieldValue::UInt8(next));
        record.push(
            "next_header_name",
            match next_header_name(next) {
                Some(name) => FieldValue::Str(name),
                None => FieldValue::Text(format_compact!("Unknown ({next})")),
            },
        );
        record.push("hop_limit", FieldValue::UInt8(ipv6.hop_limit()));
        record.push("src_ip", FieldValue::ipv6(ipv6.source()));
        record.push("dst_ip", FieldValue::ipv6(ipv6.destination()));

        Ok(record)
    }

    fn next_protocol(&self, record: &LayerRecord) -> Option<ProtocolTag> {
        match record.get_u64("next_header")? as u8 {
            ip_protocol::TCP => Some(ProtocolTag::Tcp),
            ip_protocol::UDP => Some(ProtocolTag::Udp),
            _ => None,
        }
    }
}
