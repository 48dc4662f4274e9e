use bytes::Bytes;

/// DLT_EN10MB, the only link type the decoder starts from.
pub const LINKTYPE_ETHERNET: u16 = 1;

/// One frame as read from a capture file, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// 1-based position in the file.
    pub frame_number: u64,
    /// Capture time in microseconds since the Unix epoch.
    pub timestamp_us: i64,
    /// Bytes stored in the file (may be less than `original_length`).
    pub captured_length: u32,
    /// Length of the frame on the wire.
    pub original_length: u32,
    pub link_type: u16,
    pub data: Bytes,
}

impl RawFrame {
    /// Capture time in fractional seconds, as the processor expects it.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_us as f64 / 1_000_000.0
    }

    /// True when the capture snap length cut the frame short.
    pub fn is_truncated(&self) -> bool {
        self.captured_length < self.original_length
    }

    pub fn is_ethernet(&self) -> bool {
        self.link_type == LINKTYPE_ETHERNET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_and_truncation() {
        let frame = RawFrame {
            frame_number: 1,
            timestamp_us: 1_500_000,
            captured_length: 64,
            original_length: 1514,
            link_type: LINKTYPE_ETHERNET,
            data: Bytes::from_static(&[0; 64]),
        };
        assert_eq!(frame.timestamp_secs(), 1.5);
        assert!(frame.is_truncated());
        assert!(frame.is_ethernet());
    }
}
