//! IPv4 protocol parser.

use compact_str::format_compact;

use super::{
    available, header_window, read_array, FieldValue, LayerRecord, Protocol, ProtocolTag,
};
use crate::error::DecodeError;

/// Minimum IPv4 header length (IHL = 5).
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// IP protocol numbers (shared with IPv6 next-header values).
#[allow(dead_code)]
pub mod ip_protocol {
    pub const ICMP: u8 = 1;
    pub const IGMP: u8 = 2;
    pub const IP_IN_IP: u8 = 4;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const IPV6: u8 = 41;
    pub const GRE: u8 = 47;
    pub const ESP: u8 = 50;
    pub const AH: u8 = 51;
    pub const ICMPV6: u8 = 58;
    pub const OSPF: u8 = 89;
}

/// Name of an IP protocol number, or `None` if it is not in the table.
pub fn protocol_name(value: u8) -> Option<&'static str> {
    Some(match value {
        ip_protocol::ICMP => "ICMP",
        ip_protocol::IGMP => "IGMP",
        ip_protocol::IP_IN_IP => "IP-in-IP",
        ip_protocol::TCP => "TCP",
        ip_protocol::UDP => "UDP",
        ip_protocol::IPV6 => "IPv6",
        ip_protocol::GRE => "GRE",
        ip_protocol::ESP => "ESP",
        ip_protocol::AH => "AH",
        ip_protocol::OSPF => "OSPF",
        _ => return None,
    })
}

/// IPv4 protocol parser.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Protocol;

impl Protocol for Ipv4Protocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Ipv4
    }

    fn min_header_len(&self) -> usize {
        IPV4_MIN_HEADER_LEN
    }

    fn can_decode(&self, data: &[u8], offset: usize) -> bool {
        available(data, offset) >= IPV4_MIN_HEADER_LEN && data[offset] >> 4 == 4
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let w = header_window(data, offset, IPV4_MIN_HEADER_LEN, "IPv4")?;

        let version = w[0] >> 4;
        if version != 4 {
            return Err(DecodeError::malformed(
                "IPv4",
                "version",
                format!("expected 4, found {version}"),
            ));
        }

        let ihl = w[0] & 0x0F;
        let header_len = ihl as usize * 4;
        if header_len < IPV4_MIN_HEADER_LEN {
            return Err(DecodeError::malformed(
                "IPv4",
                "header_length",
                format!("IHL {ihl} is below the minimum of 5"),
            ));
        }
        let have = available(data, offset);
        if header_len > have {
            return Err(DecodeError::malformed(
                "IPv4",
                "header_length",
                format!("header claims {header_len} bytes but only {have} remain"),
            ));
        }

        let flags_fragment = u16::from_be_bytes([w[6], w[7]]);
        let protocol = w[9];

        let mut record = LayerRecord::new(ProtocolTag::Ipv4, offset, header_len);
        record.push("version", FieldValue::UInt8(version));
        record.push("header_length", FieldValue::UInt8(header_len as u8));
        record.push("tos", FieldValue::UInt8(w[1]));
        record.push("total_length", FieldValue::UInt16(u16::from_be_bytes([w[2], w[3]])));
        record.push("identification", FieldValue::UInt16(u16::from_be_bytes([w[4], w[5]])));
        record.push("flags", FieldValue::UInt8(((flags_fragment >> 13) & 0x07) as u8));
        record.push("fragment_offset", FieldValue::UInt16(flags_fragment & 0x1FFF));
        record.push("ttl", FieldValue::UInt8(w[8]));
        record.push("protocol", FieldValue::UInt8(protocol));
        record.push(
            "protocol_name",
            match protocol_name(protocol) {
                Some(name) => FieldValue::Str(name),
                None => FieldValue::Text(format_compact!("Unknown ({protocol})")),
            },
        );
        record.push("checksum", FieldValue::UInt16(u16::from_be_bytes([w[10], w[11]])));
        record.push("src_ip", FieldValue::ipv4(read_array(&w[12..16])));
        record.push("dst_ip", FieldValue::ipv4(read_array(&w[16..20])));

        Ok(record)
    }

    fn next_protocol(&self, record: &LayerRecord) -> Option<ProtocolTag> {
        // Later fragments carry no transport header
        if record.get_u16("fragment_offset")? != 0 {
            return None;
        }

        match record.get_u64("protocol")? as u8 {
            ip_protocol::ICMP => Some(ProtocolTag::Icmp),
            ip_protocol::TCP => Some(ProtocolTag::Tcp),
            ip_protocol::UDP => Some(ProtocolTag::Udp),
            _ => None,
        }
    }
}
