//! TCP protocol parser.

use etherparse::TcpHeaderSlice;

use super::{available, header_window, FieldValue, FlagSet, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// Minimum TCP header length (data offset = 5).
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// TCP flags bit positions (low 9 bits of the offset/flags word).
///
/// `NS` is the ECN nonce sum bit from RFC 3540.
#[allow(dead_code)]
pub mod flags {
    pub const FIN: u16 = 0x001;
    pub const SYN: u16 = 0x002;
    pub const RST: u16 = 0x004;
    pub const PSH: u16 = 0x008;
    pub const ACK: u16 = 0x010;
    pub const URG: u16 = 0x020;
    pub const ECE: u16 = 0x040;
    pub const CWR: u16 = 0x080;
    pub const NS: u16 = 0x100;

    /// All flag bits.
    pub const MASK: u16 = 0x1FF;

    /// Flag names in bit order.
    pub const NAMES: [(&str, u16); 9] = [
        ("FIN", FIN),
        ("SYN", SYN),
        ("RST", RST),
        ("PSH", PSH),
        ("ACK", ACK),
        ("URG", URG),
        ("ECE", ECE),
        ("CWR", CWR),
        ("NS", NS),
    ];
}

/// Expand a flag word into an ordered name -> bool mapping.
pub fn flag_set(bits: u16) -> FlagSet {
    flags::NAMES
        .iter()
        .map(|(name, bit)| (*name, bits & bit != 0))
        .collect()
}

/// TCP protocol parser.
///
/// Options are skipped (they count toward `header_length`); segment
/// payload is left for the decoder to report.
#[derive(Debug, Clone, Copy)]
pub struct TcpProtocol;

impl Protocol for TcpProtocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Tcp
    }

    fn min_header_len(&self) -> usize {
        TCP_MIN_HEADER_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let w = header_window(data, offset, TCP_MIN_HEADER_LEN, "TCP")?;

        let offset_flags = u16::from_be_bytes([w[12], w[13]]);
        let data_offset = (offset_flags >> 12) as u8;
        let header_len = data_offset as usize * 4;
        if header_len < TCP_MIN_HEADER_LEN {
            return Err(DecodeError::malformed(
                "TCP",
                "header_length",
                format!("data offset {data_offset} is below the minimum of 5"),
            ));
        }
        let have = available(data, offset);
        if header_len > have {
            return Err(DecodeError::malformed(
                "TCP",
                "header_length",
                format!("header claims {header_len} bytes but only {have} remain"),
            ));
        }

        let tcp = TcpHeaderSlice::from_slice(&data[offset..offset + header_len])
            .map_err(|e| DecodeError::malformed("TCP", "header", e.to_string()))?;

        let flag_bits = offset_flags & flags::MASK;

        let mut record = LayerRecord::new(ProtocolTag::Tcp, offset, header_len);
        record.push("src_port", FieldValue::UInt16(tcp.source_port()));
        record.push("dst_port", FieldValue::UInt16(tcp.destination_port()));
        record.push("seq", FieldValue::UInt32(tcp.sequence_number()));
        record.push("ack", FieldValue::UInt32(tcp.acknowledgment_number()));
        record.push("header_length", FieldValue::UInt8(header_len as u8));
        record.push("flags", FieldValue::UInt16(flag_bits));
        record.push("flags_detail", FieldValue::Flags(flag_set(flag_bits)));
        record.push("window_size", FieldValue::UInt16(tcp.window_size()));
        record.push("checksum", FieldValue::UInt16(tcp.checksum()));
        record.push("urgent_pointer", FieldValue::UInt16(tcp.urgent_pointer()));

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp_syn() {
        let header = [
            0x1f, 0x90, // src port: 8080
            0x00, 0x50, // dst port: 80
            0x00, 0x00, 0x00, 0x01, // seq: 1
            0x00, 0x00, 0x00, 0x00, // ack: 0
            0x50, 0x02, // data offset 5, flags: SYN
            0xff, 0xff, // window: 65535
            0x12, 0x34, // checksum
            0x00, 0x00, // urgent pointer
        ];

        let record = TcpProtocol.decode(&header, 0).unwrap();

        assert_eq!(record.header_len(), 20);
        assert_eq!(record.get("src_port"), Some(&FieldValue::UInt16(8080)));
        assert_eq!(record.get("dst_port"), Some(&FieldValue::UInt16(80)));
        assert_eq!(record.get("seq"), Some(&FieldValue::UInt32(1)));
        assert_eq!(record.get("flags"), Some(&FieldValue::UInt16(flags::SYN)));
        assert_eq!(record.flag("flags_detail", "SYN"), Some(true));
        assert_eq!(record.flag("flags_detail", "ACK"), Some(false));
        assert_eq!(record.get("window_size"), Some(&FieldValue::UInt16(65535)));
        assert_eq!(record.get("checksum"), Some(&FieldValue::UInt16(0x1234)));
        assert_eq!(TcpProtocol.next_protocol(&record), None);
    }

    #[test]
    fn test_nine_bit_flags() {
        let mut header = [0u8; 20];
        header[12] = 0x51; // data offset 5, NS bit set
        header[13] = 0x18; // PSH | ACK

        let record = TcpProtocol.decode(&header, 0).unwrap();
        assert_eq!(
            record.get("flags"),
            Some(&FieldValue::UInt16(flags::NS | flags::PSH | flags::ACK))
        );
        assert_eq!(record.flag("flags_detail", "NS"), Some(true));
        assert_eq!(record.flag("flags_detail", "PSH"), Some(true));
        assert_eq!(record.flag("flags_detail", "FIN"), Some(false));

        // The reserved bits between the offset nibble and NS never leak into flags
        header[12] = 0x5e;
        let record = TcpProtocol.decode(&header, 0).unwrap();
        assert_eq!(record.get_u16("flags"), Some(flags::PSH | flags::ACK));
    }

    #[test]
    fn test_flag_set_order() {
        let set = flag_set(flags::FIN | flags::CWR);
        let names: Vec<_> = set.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["FIN", "SYN", "RST", "PSH", "ACK", "URG", "ECE", "CWR", "NS"]
        );
        let set_names: Vec<_> = set.iter().filter(|(_, s)| *s).map(|(n, _)| *n).collect();
        assert_eq!(set_names, vec!["FIN", "CWR"]);
    }

    #[test]
    fn test_tcp_options_extend_header() {
        let mut segment = vec![0u8; 24];
        segment[12] = 0x60; // data offset 6
        segment[20..24].copy_from_slice(&[0x02, 0x04, 0x05, 0xb4]); // MSS 1460
        segment.extend_from_slice(b"GET /");

        let record = TcpProtocol.decode(&segment, 0).unwrap();
        assert_eq!(record.header_len(), 24);
        assert_eq!(record.get("header_length"), Some(&FieldValue::UInt8(24)));
    }

    #[test]
    fn test_data_offset_below_minimum() {
        let mut header = [0u8; 20];
        header[12] = 0x40; // data offset 4

        assert!(TcpProtocol.can_decode(&header, 0));
        assert!(matches!(
            TcpProtocol.decode(&header, 0),
            Err(DecodeError::MalformedHeader { field: "header_length", .. })
        ));
    }

    #[test]
    fn test_data_offset_beyond_buffer() {
        let mut header = [0u8; 20];
        header[12] = 0x80; // data offset 8: 32 bytes

        assert!(matches!(
            TcpProtocol.decode(&header, 0),
            Err(DecodeError::MalformedHeader { field: "header_length", .. })
        ));
    }

    #[test]
    fn test_parse_tcp_too_short() {
        let short = [0x00, 0x50, 0x01, 0xbb];

        assert!(!TcpProtocol.can_decode(&short, 0));
        assert!(matches!(
            TcpProtocol.decode(&short, 0),
            Err(DecodeError::InsufficientData { .. })
        ));
    }
}
