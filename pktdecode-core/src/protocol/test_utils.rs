//! Test utilities for protocol decoding.
//!
//! Provides builders for constructing test frames and helper functions
//! for checking decoded layers.

use super::{LayerRecord, FieldValue};

/// Builder for constructing Ethernet frames.
#[derive(Debug, Clone)]
pub struct EthernetBuilder {
    src_mac: [u8; 6],
    dst_mac: [u8; 6],
    ethertype: u16,
    payload: Vec<u8>,
}

impl Default for EthernetBuilder {
    fn default() -> Self {
        Self {
            src_mac: [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb],
            dst_mac: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            ethertype: 0x0800, // IPv4
            payload: Vec::new(),
        }
    }
}

impl EthernetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_mac(mut self, mac: [u8; 6]) -> Self {
        self.src_mac = mac;
        self
    }

    pub fn dst_mac(mut self, mac: [u8; 6]) -> Self {
        self.dst_mac = mac;
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn ipv6(self) -> Self {
        self.ethertype(0x86DD)
    }

    pub fn arp(self) -> Self {
        self.ethertype(0x0806)
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(14 + self.payload.len());
        frame.extend_from_slice(&self.dst_mac);
        frame.extend_from_slice(&self.src_mac);
        frame.extend_from_slice(&self.ethertype.to_be_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Builder for constructing IPv4 headers.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    version_ihl: u8,
    flags_fragment: u16,
    ttl: u8,
    protocol: u8,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    options: Vec<u8>,
    payload: Vec<u8>,
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self {
            version_ihl: 0x45, // Version 4, IHL 5 (20 bytes)
            flags_fragment: 0x4000, // DF
            ttl: 64,
            protocol: 6, // TCP
            src_ip: [192, 168, 0, 1],
            dst_ip: [192, 168, 0, 2],
            options: Vec::new(),
            payload: Vec::new(),
        }
    }
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn tcp(self) -> Self {
        self.protocol(6)
    }

    pub fn udp(self) -> Self {
        self.protocol(17)
    }

    pub fn icmp(self) -> Self {
        self.protocol(1)
    }

    pub fn src_ip(mut self, ip: [u8; 4]) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dst_ip(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip = ip;
        self
    }

    /// Override the raw version/IHL byte (for malformed-header tests).
    pub fn version_ihl(mut self, byte: u8) -> Self {
        self.version_ihl = byte;
        self
    }

    /// Append option bytes and bump IHL to cover them.
    pub fn options(mut self, options: Vec<u8>) -> Self {
        assert_eq!(options.len() % 4, 0, "options must be whole 32-bit words");
        self.version_ihl = 0x40 | (5 + (options.len() / 4) as u8);
        self.options = options;
        self
    }

    pub fn flags_fragment(mut self, value: u16) -> Self {
        self.flags_fragment = value;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let header_len = 20 + self.options.len();
        let total_length = (header_len + self.payload.len()) as u16;
        let mut header = Vec::with_capacity(header_len + self.payload.len());

        header.push(self.version_ihl);
        header.push(0x00); // TOS
        header.extend_from_slice(&total_length.to_be_bytes());
        header.extend_from_slice(&0x0001u16.to_be_bytes()); // Identification
        header.extend_from_slice(&self.flags_fragment.to_be_bytes());
        header.push(self.ttl);
        header.push(self.protocol);
        header.extend_from_slice(&[0x00, 0x00]); // Checksum (not calculated)
        header.extend_from_slice(&self.src_ip);
        header.extend_from_slice(&self.dst_ip);
        header.extend_from_slice(&self.options);
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Builder for constructing IPv6 headers.
#[derive(Debug, Clone)]
pub struct Ipv6Builder {
    next_header: u8,
    src_ip: [u8; 16],
    dst_ip: [u8; 16],
    payload: Vec<u8>,
}

impl Default for Ipv6Builder {
    fn default() -> Self {
        let mut src_ip = [0u8; 16];
        src_ip[..4].copy_from_slice(&[0x20, 0x01, 0x0d, 0xb8]);
        src_ip[15] = 1;
        let mut dst_ip = src_ip;
        dst_ip[15] = 2;

        Self {
            next_header: 17, // UDP
            src_ip,
            dst_ip,
            payload: Vec::new(),
        }
    }
}

impl Ipv6Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_header(mut self, next_header: u8) -> Self {
        self.next_header = next_header;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut header = Vec::with_capacity(40 + self.payload.len());

        header.extend_from_slice(&[0x60, 0x00, 0x00, 0x00]); // Version 6, TC 0, flow 0
        header.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        header.push(self.next_header);
        header.push(64); // Hop limit
        header.extend_from_slice(&self.src_ip);
        header.extend_from_slice(&self.dst_ip);
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Builder for constructing TCP headers.
#[derive(Debug, Clone)]
pub struct TcpBuilder {
    src_port: u16,
    dst_port: u16,
    seq: u32,
    data_offset: u8,
    flags: u16,
    payload: Vec<u8>,
}

impl Default for TcpBuilder {
    fn default() -> Self {
        Self {
            src_port: 8080,
            dst_port: 80,
            seq: 1,
            data_offset: 5, // 20 bytes
            flags: 0x02,    // SYN
            payload: Vec::new(),
        }
    }
}

impl TcpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Flag bits, including NS (0x100).
    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn psh_ack(self) -> Self {
        self.flags(0x18)
    }

    /// Override the data offset nibble (for malformed-header tests).
    pub fn data_offset(mut self, words: u8) -> Self {
        self.data_offset = words;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut header = Vec::with_capacity(20 + self.payload.len());
        let offset_flags = ((self.data_offset as u16) << 12) | (self.flags & 0x1FF);

        header.extend_from_slice(&self.src_port.to_be_bytes());
        header.extend_from_slice(&self.dst_port.to_be_bytes());
        header.extend_from_slice(&self.seq.to_be_bytes());
        header.extend_from_slice(&0u32.to_be_bytes()); // Ack
        header.extend_from_slice(&offset_flags.to_be_bytes());
        header.extend_from_slice(&65535u16.to_be_bytes()); // Window
        header.extend_from_slice(&[0x00, 0x00]); // Checksum
        header.extend_from_slice(&[0x00, 0x00]); // Urgent pointer
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Builder for constructing UDP headers.
#[derive(Debug, Clone)]
pub struct UdpBuilder {
    src_port: u16,
    dst_port: u16,
    payload: Vec<u8>,
}

impl Default for UdpBuilder {
    fn default() -> Self {
        Self {
            src_port: 12345,
            dst_port: 53,
            payload: Vec::new(),
        }
    }
}

impl UdpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let length = 8 + self.payload.len() as u16;
        let mut header = Vec::with_capacity(8 + self.payload.len());

        header.extend_from_slice(&self.src_port.to_be_bytes());
        header.extend_from_slice(&self.dst_port.to_be_bytes());
        header.extend_from_slice(&length.to_be_bytes());
        header.extend_from_slice(&[0x00, 0x00]); // Checksum
        header.extend_from_slice(&self.payload);

        header
    }
}

/// Build an ICMP echo request with the given identifier and sequence.
pub fn icmp_echo_request(id: u16, seq: u16) -> Vec<u8> {
    let mut packet = vec![0x08, 0x00, 0x00, 0x00]; // Type, code, checksum
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&seq.to_be_bytes());
    packet
}

/// Build an Ethernet/IPv4 ARP request body (28 bytes).
pub fn arp_request(sender_ip: [u8; 4], target_ip: [u8; 4]) -> Vec<u8> {
    let mut packet = vec![
        0x00, 0x01, // Hardware type: Ethernet
        0x08, 0x00, // Protocol type: IPv4
        0x06, 0x04, // Sizes
        0x00, 0x01, // Operation: Request
    ];
    packet.extend_from_slice(&[0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
    packet.extend_from_slice(&sender_ip);
    packet.extend_from_slice(&[0x00; 6]);
    packet.extend_from_slice(&target_ip);
    packet
}

/// Build a complete Ethernet/IPv4/TCP frame.
pub fn build_tcp_frame(src_port: u16, dst_port: u16, payload: Vec<u8>) -> Vec<u8> {
    let tcp = TcpBuilder::new()
        .src_port(src_port)
        .dst_port(dst_port)
        .psh_ack()
        .payload(payload)
        .build();

    let ipv4 = Ipv4Builder::new().tcp().payload(tcp).build();

    EthernetBuilder::new().payload(ipv4).build()
}

/// Build a complete Ethernet/IPv4/UDP frame.
pub fn build_udp_frame(src_port: u16, dst_port: u16, payload: Vec<u8>) -> Vec<u8> {
    let udp = UdpBuilder::new()
        .src_port(src_port)
        .dst_port(dst_port)
        .payload(payload)
        .build();

    let ipv4 = Ipv4Builder::new().udp().payload(udp).build();

    EthernetBuilder::new().payload(ipv4).build()
}

/// Helper to assert a field value equals expected.
pub fn assert_field_eq(record: &LayerRecord, field: &str, expected: &FieldValue) {
    let actual = record
        .get(field)
        .unwrap_or_else(|| panic!("Field '{}' not found in {} record", field, record.tag()));
    assert_eq!(
        actual, expected,
        "Field '{}' mismatch: expected {:?}, got {:?}",
        field, expected, actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethernet_builder() {
        let frame = EthernetBuilder::new()
            .src_mac([0x11, 0x22, 0x33, 0x44, 0x55, 0x66])
            .dst_mac([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])
            .ethertype(0x0800)
            .payload(vec![0x45, 0x00])
            .build();

        assert_eq!(frame.len(), 16); // 14 header + 2 payload
        assert_eq!(&frame[0..6], &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]); // dst
        assert_eq!(&frame[6..12], &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]); // src
        assert_eq!(&frame[12..14], &[0x08, 0x00]); // ethertype
    }

    #[test]
    fn test_ipv4_builder_with_options() {
        let packet = Ipv4Builder::new()
            .options(vec![0x01, 0x01, 0x01, 0x00])
            .payload(vec![0xff; 4])
            .build();

        assert_eq!(packet.len(), 28);
        assert_eq!(packet[0], 0x46); // Version + IHL 6
        assert_eq!(&packet[2..4], &28u16.to_be_bytes()); // Total length
    }

    #[test]
    fn test_tcp_builder_ns_flag() {
        let segment = TcpBuilder::new().flags(0x110).build();

        assert_eq!(segment.len(), 20);
        assert_eq!(segment[12], 0x51); // Data offset 5 + NS
        assert_eq!(segment[13], 0x10); // ACK
    }

    #[test]
    fn test_build_tcp_frame_length() {
        let frame = build_tcp_frame(8080, 80, b"hello".to_vec());
        assert_eq!(frame.len(), 14 + 20 + 20 + 5);
    }
}
