//! UDP protocol parser.

use etherparse::UdpHeaderSlice;

use super::{header_window, FieldValue, LayerRecord, Protocol, ProtocolTag};
use crate::error::DecodeError;

/// UDP header length.
pub const UDP_HEADER_LEN: usize = 8;

/// UDP protocol parser.
#[derive(Debug, Clone, Copy)]
pub struct UdpProtocol;

impl Protocol for UdpProtocol {
    fn tag(&self) -> ProtocolTag {
        ProtocolTag::Udp
    }

    fn min_header_len(&self) -> usize {
        UDP_HEADER_LEN
    }

    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        let window = header_window(data, offset, UDP_HEADER_LEN, "UDP")?;
        let udp = UdpHeaderSlice::from_slice(window)
            .map_err(|e| DecodeError::malformed("UDP", "header", e.to_string()))?;

        let mut record = LayerRecord::new(ProtocolTag::Udp, offset, UDP_HEADER_LEN);
        record.push("src_port", FieldValue::UInt16(udp.source_port()));
        record.push("dst_port", FieldValue::UInt16(udp.destination_port()));
        record.push("length", FieldValue::UInt16(udp.length()));
        record.push("checksum", FieldValue::UInt16(udp.checksum()));

        Ok(record)
    }
}
