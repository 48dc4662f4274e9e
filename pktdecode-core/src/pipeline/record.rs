//! The persisted form of a decoded packet.

use bytes::Bytes;
use compact_str::CompactString;

use crate::packet::DecodedPacket;

/// Protocol column value for a frame with no decoded layer.
pub const UNKNOWN_PROTOCOL: &str = "Unknown";

/// One row headed for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    /// Capture time, seconds since the Unix epoch.
    pub timestamp: f64,
    pub src_ip: Option<CompactString>,
    pub dst_ip: Option<CompactString>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    /// Name of the innermost decoded layer.
    pub protocol: &'static str,
    /// Frame length in bytes.
    pub length: usize,
    /// Raw frame, when the pipeline is configured to keep it.
    pub raw_data: Option<Bytes>,
    pub session_id: Option<i64>,
}

impl BatchRecord {
    /// Derive a record from a decoded packet.
    ///
    /// The raw bytes are shared with the packet, not copied.
    pub fn from_packet(
        packet: &DecodedPacket,
        timestamp: f64,
        store_raw: bool,
        session_id: Option<i64>,
    ) -> Self {
        Self {
            timestamp,
            src_ip: packet.src_ip().map(CompactString::from),
            dst_ip: packet.dst_ip().map(CompactString::from),
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            protocol: packet
                .innermost()
                .map(|l| l.tag().name())
                .unwrap_or(UNKNOWN_PROTOCOL),
            length: packet.len(),
            raw_data: store_raw.then(|| packet.raw().clone()),
            session_id,
        }
    }
}
