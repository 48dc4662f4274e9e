//! ARP protocol parser.

use compact_str::format_compact;

use super::ethernet::ethertype;
use super::{header_window, read_array, FieldValue, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// ARP packet length for Ethernet/IPv4 (the only layout decoded).
pub const ARP_PACKET_LEN: usize = 28;

/// ARP operation codes.
#[allow(dead_code)]
pub mod operation {
    pub const REQUEST: u16 = 1;
    pub const REPLY: u16 = 2;
    pub const RARP_REQUEST: u16 = 3;
    pub const RARP_REPLY: u16 = 4;
    pub const DRARP_REQUEST: u16 = 5;
    pub const DRARP_REPLY: u16 = 6;
    pub const DRARP_ERROR: u16 = 7;
    pub const INARP_REQUEST: u16 = 8;
    pub const INARP_REPLY: u16 = 9;
}

fn operation_name(opcode: u16) -> Option<&'static str> {
    Some(match opcode {
        operation::REQUEST => "ARP Request",
        operation::REPLY => "ARP Reply",
        operation::RARP_REQUEST => "RARP Request",
        operation::RARP_REPLY => "RARP Reply",
        operation::DRARP_REQUEST => "DRARP Request",
        operation::DRARP_REPLY => "DRARP Reply",
        operation::DRARP_ERROR => "DRARP Error",
        operation::INARP_REQUEST => "InARP Request",
        operation::INARP_REPLY => "InARP Reply",
        _ => return None,
    })
}

// IANA ARP hardware types
fn hardware_type_name(value: u16) -> Option<&'static str> {
    Some(match value {
        1 => "Ethernet",
        2 => "Experimental Ethernet",
        3 => "Amateur Radio AX.25",
        4 => "Proteon ProNET Token Ring",
        5 => "Chaos",
        6 => "IEEE 802 Networks",
        7 => "ARCNET",
        8 => "Hyperchannel",
        9 => "Lanstar",
        10 => "Autonet Short Address",
        11 => "LocalTalk",
        12 => "LocalNet",
        13 => "Ultra link",
        14 => "SMDS",
        15 => "Frame Relay",
        16 | 19 | 21 => "Asynchronous Transmission Mode (ATM)",
        17 => "HDLC",
        18 => "Fibre Channel",
        20 => "Serial Line",
        _ => return None,
    })
}

fn protocol_type_name(value: u16) -> Option<&'static str> {
    Some(match value {
        ethertype::IPV4 => "IPv4",
        ethertype::ARP => "ARP",
        0x8035 => "RARP",
        ethertype::IPV6 => "IPv6",
        ethertype::VLAN => "VLAN-tagged frame",
        0x8137 => "IPX",
        0x8863 => "PPPoE Discovery Stage",
        0x8864 => "PPPoE Session Stage",
        _ => return None,
    })
}

fn named(name: Option<&'static str>, value: u16) -> FieldValue {
    match name {
        Some(name) => FieldValue::Str(name),
        None => FieldValue::Text(format_compact!("Unknown ({value})")),
    }
}

/// ARP protocol parser.
#[derive(Debug, Clone, Copy)]
pub struct ArpProtocol;

impl Protocol for ArpProtocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Arp
    }

    fn min_header_len(&self) -> usize {
        ARP_PACKET_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let w = header_window(data, offset, ARP_PACKET_LEN, "ARP")?;

        let hardware_type = u16::from_be_bytes([w[0], w[1]]);
        let protocol_type = u16::from_be_bytes([w[2], w[3]]);
        let hardware_size = w[4];
        let protocol_size = w[5];
        let opcode = u16::from_be_bytes([w[6], w[7]]);

        // The fixed 28-byte layout only holds 6-byte hardware and 4-byte protocol addresses
        if hardware_size != 6 {
            return Err(DecodeError::malformed(
                "ARP",
                "hardware_size",
                format!("{hardware_size} does not fit the 28-byte Ethernet layout"),
            ));
        }
        if protocol_size != 4 {
            return Err(DecodeError::malformed(
                "ARP",
                "protocol_size",
                format!("{protocol_size} does not fit the 28-byte IPv4 layout"),
            ));
        }

        let mut record = LayerRecord::new(ProtocolTag::Arp, offset, ARP_PACKET_LEN);
        record.push("hardware_type", FieldValue::UInt16(hardware_type));
        record.push(
            "hardware_type_name",
            named(hardware_type_name(hardware_type), hardware_type),
        );
        record.push("protocol_type", FieldValue::UInt16(protocol_type));
        record.push(
            "protocol_type_name",
            match protocol_type_name(protocol_type) {
                Some(name) => FieldValue::Str(name),
                None => FieldValue::Text(format_compact!("Unknown Protocol Type (0x{protocol_type:04x})")),
            },
        );
        record.push("hardware_size", FieldValue::UInt8(hardware_size));
        record.push("protocol_size", FieldValue::UInt8(protocol_size));
        record.push("opcode", FieldValue::UInt16(opcode));
        record.push("operation", named(operation_name(opcode), opcode));
        record.push("sender_mac", FieldValue::mac(read_array(&w[8..14])));
        record.push("sender_ip", FieldValue::ipv4(read_array(&w[14..18])));
        record.push("target_mac", FieldValue::mac(read_array(&w[18..24])));
        record.push("target_ip", FieldValue::ipv4(read_array(&w[24..28])));

        Ok(record)
    }
}
