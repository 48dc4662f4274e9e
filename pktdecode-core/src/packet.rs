//! Decoded packet aggregate.

use std::ops::Range;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::protocol::{LayerRecord, ProtocolTag};

/// Why the decode chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every byte was consumed by headers.
    Exhausted,
    /// The last layer names no further protocol.
    Terminal(ProtocolTag),
    /// The next protocol has no registered parser.
    Unregistered(ProtocolTag),
    /// Too few bytes remained for the next header.
    Insufficient(ProtocolTag),
    /// The next header failed a consistency check.
    Malformed(ProtocolTag),
}

/// The result of running the layer chain over one frame.
///
/// Layers are ordered outermost first. Headers and payload partition the
/// raw buffer: `sum(header_len) + payload.len() == raw.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    raw: Bytes,
    layers: SmallVec<[LayerRecord; 4]>,
    payload: Range<usize>,
    errors: Vec<String>,
    stop: StopReason,
}

impl DecodedPacket {
    pub(crate) fn new(
        raw: Bytes,
        layers: SmallVec<[LayerRecord; 4]>,
        payload_start: usize,
        errors: Vec<String>,
        stop: StopReason,
    ) -> Self {
        let end = raw.len();
        Self {
            raw,
            layers,
            payload: payload_start.min(end)..end,
            errors,
            stop,
        }
    }

    /// The frame as captured.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Frame length in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True for a zero-length frame (never produced by the decoder).
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Decoded layers, outermost first.
    pub fn layers(&self) -> &[LayerRecord] {
        &self.layers
    }

    /// First layer decoded as `tag`.
    pub fn layer(&self, tag: ProtocolTag) -> Option<&LayerRecord> {
        self.layers.iter().find(|l| l.tag() == tag)
    }

    pub fn has_layer(&self, tag: ProtocolTag) -> bool {
        self.layer(tag).is_some()
    }

    /// Innermost decoded layer.
    pub fn innermost(&self) -> Option<&LayerRecord> {
        self.layers.last()
    }

    /// Bytes after the last decoded header.
    pub fn payload(&self) -> &[u8] {
        &self.raw[self.payload.clone()]
    }

    /// Payload position within the raw buffer.
    pub fn payload_range(&self) -> Range<usize> {
        self.payload.clone()
    }

    /// Non-fatal decode errors, in the order they occurred.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop
    }

    /// Protocol names from outermost to innermost.
    pub fn protocol_stack(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.tag().name()).collect()
    }

    /// Source address from the network layer (IPv4, IPv6, or ARP sender).
    pub fn src_ip(&self) -> Option<&str> {
        self.network_field("src_ip", "sender_ip")
    }

    /// Destination address from the network layer (IPv4, IPv6, or ARP target).
    pub fn dst_ip(&self) -> Option<&str> {
        self.network_field("dst_ip", "target_ip")
    }

    pub fn src_port(&self) -> Option<u16> {
        self.transport_port("src_port")
    }

    pub fn dst_port(&self) -> Option<u16> {
        self.transport_port("dst_port")
    }

    fn network_field(&self, ip_field: &str, arp_field: &str) -> Option<&str> {
        self.layers.iter().find_map(|l| match l.tag() {
            ProtocolTag::Ipv4 | ProtocolTag::Ipv6 => l.get_str(ip_field),
            ProtocolTag::Arp => l.get_str(arp_field),
            _ => None,
        })
    }

    fn transport_port(&self, field: &str) -> Option<u16> {
        self.layers.iter().find_map(|l| match l.tag() {
            ProtocolTag::Tcp | ProtocolTag::Udp => l.get_u16(field),
            _ => None,
        })
    }

    /// Check structural consistency; returns a description of each problem.
    ///
    /// A packet produced by the decoder always validates cleanly.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut expected = 0;

        for layer in &self.layers {
            if layer.offset() != expected {
                issues.push(format!(
                    "{} starts at {} but the previous layer ended at {}",
                    layer.tag(),
                    layer.offset(),
                    expected
                ));
            }
            if layer.header_len() == 0 {
                issues.push(format!("{} consumed no bytes", layer.tag()));
            }
            expected = layer.end();
        }

        if self.payload.start != expected {
            issues.push(format!(
                "payload starts at {} but headers end at {}",
                self.payload.start, expected
            ));
        }

        let headers: usize = self.layers.iter().map(LayerRecord::header_len).sum();
        if headers + self.payload.len() != self.raw.len() {
            issues.push(format!(
                "headers ({headers}) + payload ({}) != frame length ({})",
                self.payload.len(),
                self.raw.len()
            ));
        }

        issues
    }
}
