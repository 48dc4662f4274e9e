//! Frame builders shared by the integration tests.

#![allow(dead_code)]

pub const DST_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const SRC_MAC: [u8; 6] = [0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];

/// Ethernet II header followed by `payload`.
pub fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(14 + payload.len());
    frame.extend_from_slice(&DST_MAC);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// 20-byte IPv4 header (DF, TTL 64) followed by `payload`.
pub fn ipv4(protocol: u8, src: [u8; 4], dst: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let total = (20 + payload.len()) as u16;
    let mut packet = vec![
        0x45, 0x00, // version/IHL, DSCP/ECN
    ];
    packet.extend_from_slice(&total.to_be_bytes());
    packet.extend_from_slice(&[
        0x12, 0x34, // identification
        0x40, 0x00, // flags (DF), fragment offset 0
        0x40, protocol, // TTL, protocol
        0x00, 0x00, // checksum (not verified)
    ]);
    packet.extend_from_slice(&src);
    packet.extend_from_slice(&dst);
    packet.extend_from_slice(payload);
    packet
}

/// 20-byte TCP header with PSH|ACK followed by `payload`.
pub fn tcp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut segment = Vec::with_capacity(20 + payload.len());
    segment.extend_from_slice(&src_port.to_be_bytes());
    segment.extend_from_slice(&dst_port.to_be_bytes());
    segment.extend_from_slice(&1u32.to_be_bytes()); // seq
    segment.extend_from_slice(&0u32.to_be_bytes()); // ack
    segment.extend_from_slice(&[
        0x50, 0x18, // data offset 5, PSH|ACK
        0xff, 0xff, // window
        0x00, 0x00, // checksum
        0x00, 0x00, // urgent pointer
    ]);
    segment.extend_from_slice(payload);
    segment
}

pub fn udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let len = (8 + payload.len()) as u16;
    let mut datagram = Vec::with_capacity(len as usize);
    datagram.extend_from_slice(&src_port.to_be_bytes());
    datagram.extend_from_slice(&dst_port.to_be_bytes());
    datagram.extend_from_slice(&len.to_be_bytes());
    datagram.extend_from_slice(&[0x00, 0x00]); // checksum
    datagram.extend_from_slice(payload);
    datagram
}

/// Ethernet + IPv4 (192.168.0.1 -> 192.168.0.2) + TCP.
pub fn tcp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    ethernet(
        0x0800,
        &ipv4(6, [192, 168, 0, 1], [192, 168, 0, 2], &tcp(src_port, dst_port, payload)),
    )
}

/// Ethernet + IPv4 (10.0.0.1 -> 10.0.0.53) + UDP.
pub fn udp_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    ethernet(
        0x0800,
        &ipv4(17, [10, 0, 0, 1], [10, 0, 0, 53], &udp(src_port, dst_port, payload)),
    )
}

/// Ethernet + IPv6 (2001:db8::1 -> 2001:db8::2) + UDP.
pub fn ipv6_udp_frame(payload: &[u8]) -> Vec<u8> {
    let datagram = udp(5353, 5353, payload);
    let mut packet = vec![
        0x60, 0x00, 0x00, 0x00, // version 6, traffic class, flow label
    ];
    packet.extend_from_slice(&(datagram.len() as u16).to_be_bytes());
    packet.extend_from_slice(&[17, 64]); // next header UDP, hop limit
    let mut src = [0u8; 16];
    src[..4].copy_from_slice(&[0x20, 0x01, 0x0d, 0xb8]);
    src[15] = 1;
    let mut dst = src;
    dst[15] = 2;
    packet.extend_from_slice(&src);
    packet.extend_from_slice(&dst);
    packet.extend_from_slice(&datagram);
    ethernet(0x86dd, &packet)
}

/// Ethernet + ARP request from 10.0.0.1 for 10.0.0.254.
pub fn arp_frame() -> Vec<u8> {
    let mut arp = vec![
        0x00, 0x01, // hardware type Ethernet
        0x08, 0x00, // protocol type IPv4
        0x06, 0x04, // hardware size, protocol size
        0x00, 0x01, // operation request
    ];
    arp.extend_from_slice(&SRC_MAC);
    arp.extend_from_slice(&[10, 0, 0, 1]);
    arp.extend_from_slice(&[0; 6]);
    arp.extend_from_slice(&[10, 0, 0, 254]);
    ethernet(0x0806, &arp)
}

/// Small deterministic generator for pseudo-random frames.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u8
    }

    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next_u8()).collect()
    }
}
