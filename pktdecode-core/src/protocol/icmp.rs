//! ICMP protocol parser.

use compact_str::format_compact;

use super::{header_window, FieldValue, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// ICMP header length (type, code, checksum, rest of header).
pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP type constants.
#[allow(dead_code)]
pub mod icmp_type {
    pub const ECHO_REPLY: u8 = 0;
    pub const DESTINATION_UNREACHABLE: u8 = 3;
    pub const SOURCE_QUENCH: u8 = 4;
    pub const REDIRECT: u8 = 5;
    pub const ECHO_REQUEST: u8 = 8;
    pub const ROUTER_ADVERTISEMENT: u8 = 9;
    pub const ROUTER_SOLICITATION: u8 = 10;
    pub const TIME_EXCEEDED: u8 = 11;
    pub const PARAMETER_PROBLEM: u8 = 12;
    pub const TIMESTAMP_REQUEST: u8 = 13;
    pub const TIMESTAMP_REPLY: u8 = 14;
    pub const INFORMATION_REQUEST: u8 = 15;
    pub const INFORMATION_REPLY: u8 = 16;
}

fn type_name(value: u8) -> Option<&'static str> {
    use self::icmp_type::*;

    Some(match value {
        ECHO_REPLY => "Echo Reply",
        DESTINATION_UNREACHABLE => "Destination Unreachable",
        SOURCE_QUENCH => "Source Quench",
        REDIRECT => "Redirect",
        ECHO_REQUEST => "Echo Request",
        ROUTER_ADVERTISEMENT => "Router Advertisement",
        ROUTER_SOLICITATION => "Router Solicitation",
        TIME_EXCEEDED => "Time Exceeded",
        PARAMETER_PROBLEM => "Parameter Problem",
        TIMESTAMP_REQUEST => "Timestamp Request",
        TIMESTAMP_REPLY => "Timestamp Reply",
        INFORMATION_REQUEST => "Information Request",
        INFORMATION_REPLY => "Information Reply",
        _ => return None,
    })
}

/// Code names exist only for types whose codes are enumerated.
fn code_name(kind: u8, code: u8) -> Option<FieldValue> {
    let known = match (kind, code) {
        (icmp_type::DESTINATION_UNREACHABLE, 0) => Some("Network Unreachable"),
        (icmp_type::DESTINATION_UNREACHABLE, 1) => Some("Host Unreachable"),
        (icmp_type::DESTINATION_UNREACHABLE, 2) => Some("Protocol Unreachable"),
        (icmp_type::DESTINATION_UNREACHABLE, 3) => Some("Port Unreachable"),
        (icmp_type::DESTINATION_UNREACHABLE, 4) => Some("Fragmentation Needed"),
        (icmp_type::DESTINATION_UNREACHABLE, 5) => Some("Source Route Failed"),
        (icmp_type::REDIRECT, 0) => Some("Redirect for Network"),
        (icmp_type::REDIRECT, 1) => Some("Redirect for Host"),
        (icmp_type::REDIRECT, 2) => Some("Redirect for Type of Service and Network"),
        (icmp_type::REDIRECT, 3) => Some("Redirect for Type of Service and Host"),
        (icmp_type::TIME_EXCEEDED, 0) => Some("TTL Exceeded in Transit"),
        (icmp_type::TIME_EXCEEDED, 1) => Some("Fragment Reassembly Time Exceeded"),
        _ => None,
    };

    match (known, kind) {
        (Some(name), _) => Some(FieldValue::Str(name)),
        (
            None,
            icmp_type::DESTINATION_UNREACHABLE | icmp_type::REDIRECT | icmp_type::TIME_EXCEEDED,
        ) => Some(FieldValue::Text(format_compact!("Unknown Code ({code})"))),
        _ => None,
    }
}

/// ICMP protocol parser.
#[derive(Debug, Clone, Copy)]
pub struct IcmpProtocol;

impl Protocol for IcmpProtocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Icmp
    }

    fn min_header_len(&self) -> usize {
        ICMP_HEADER_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let w = header_window(data, offset, ICMP_HEADER_LEN, "ICMP")?;

        let kind = w[0];
        let code = w[1];
        let rest = u32::from_be_bytes([w[4], w[5], w[6], w[7]]);

        let mut record = LayerRecord::new(ProtocolTag::Icmp, offset, ICMP_HEADER_LEN);
        record.push("type", FieldValue::UInt8(kind));
        record.push(
            "type_name",
            match type_name(kind) {
                Some(name) => FieldValue::Str(name),
                None => FieldValue::Text(format_compact!("Unknown Type ({kind})")),
            },
        );
        record.push("code", FieldValue::UInt8(code));
        if let Some(name) = code_name(kind, code) {
            record.push("code_name", name);
        }
        record.push("checksum", FieldValue::UInt16(u16::from_be_bytes([w[2], w[3]])));
        record.push("rest_of_header", FieldValue::UInt32(rest));

        // Echo messages split the rest of the header into identifier + sequence
        if matches!(kind, icmp_type::ECHO_REQUEST | icmp_type::ECHO_REPLY) {
            record.push("identifier", FieldValue::UInt16((rest >> 16) as u16));
            record.push("sequence", FieldValue::UInt16(rest as u16));
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_icmp_echo_request() {
        let message = [
            0x08, // type: echo request
            0x00, // code
            0xf7, 0xfd, // checksum
            0x00, 0x01, // identifier
            0x00, 0x02, // sequence
            0x61, 0x62, 0x63, 0x64, // payload "abcd"
        ];

        let record = IcmpProtocol.decode(&message, 0).unwrap();

        assert_eq!(record.header_len(), 8);
        assert_eq!(record.get("type"), Some(&FieldValue::UInt8(8)));
        assert_eq!(record.get_str("type_name"), Some("Echo Request"));
        assert!(record.get("code_name").is_none());
        assert_eq!(record.get("checksum"), Some(&FieldValue::UInt16(0xf7fd)));
        assert_eq!(record.get("rest_of_header"), Some(&FieldValue::UInt32(0x0001_0002)));
        assert_eq!(record.get("identifier"), Some(&FieldValue::UInt16(1)));
        assert_eq!(record.get("sequence"), Some(&FieldValue::UInt16(2)));
    }

    #[test]
    fn test_parse_icmp_dest_unreachable() {
        let message = [
            0x03, // type: destination unreachable
            0x03, // code: port unreachable
            0x00, 0x00, // checksum
            0x00, 0x00, 0x00, 0x00, // unused
        ];

        let record = IcmpProtocol.decode(&message, 0).unwrap();
        assert_eq!(record.get_str("type_name"), Some("Destination Unreachable"));
        assert_eq!(record.get_str("code_name"), Some("Port Unreachable"));
        assert!(record.get("identifier").is_none());
    }

    #[test]
    fn test_unknown_type_and_code() {
        let record = IcmpProtocol.decode(&[42, 0, 0, 0, 0, 0, 0, 0], 0).unwrap();
        assert_eq!(record.get_str("type_name"), Some("Unknown Type (42)"));

        let record = IcmpProtocol.decode(&[11, 9, 0, 0, 0, 0, 0, 0], 0).unwrap();
        assert_eq!(record.get_str("code_name"), Some("Unknown Code (9)"));
    }

    #[test]
    fn test_parse_icmp_too_short() {
        let short = [0x08, 0x00, 0x00];

        assert!(!IcmpProtocol.can_decode(&short, 0));
        assert!(IcmpProtocol.decode(&short, 0).is_err());
    }
}
