//! Human-readable packet rendering.

use std::fmt::Write;

use crate::packet::DecodedPacket;
use crate::protocol::ProtocolTag;

/// Bytes per hex dump line.
const HEX_LINE_WIDTH: usize = 16;

/// One-line summary: size, protocol stack, endpoints.
///
/// ```text
/// 59 bytes Ethernet > IPv4 > TCP 192.168.0.1:8080 -> 192.168.0.2:80
/// ```
pub fn summary(packet: &DecodedPacket) -> String {
    let mut out = format!("{} bytes", packet.len());

    let stack = packet.protocol_stack();
    if stack.is_empty() {
        out.push_str(" (undecoded)");
    } else {
        out.push(' ');
        out.push_str(&stack.join(" > "));
    }

    if let Some(operation) = packet.layer(ProtocolTag::Arp).and_then(|l| l.get_str("operation")) {
        let _ = write!(out, " {operation}");
    }

    match (packet.src_ip(), packet.dst_ip()) {
        (Some(src), Some(dst)) => {
            let _ = write!(
                out,
                " {} -> {}",
                endpoint(src, packet.src_port()),
                endpoint(dst, packet.dst_port())
            );
        }
        _ => {
            if let Some(eth) = packet.layer(ProtocolTag::Ethernet) {
                if let (Some(src), Some(dst)) = (eth.get_str("src_mac"), eth.get_str("dst_mac")) {
                    let _ = write!(out, " {src} -> {dst}");
                }
            }
        }
    }

    if let Some(icmp) = packet.layer(ProtocolTag::Icmp) {
        if let Some(kind) = icmp.get_str("type_name") {
            let _ = write!(out, " {kind}");
        }
    }

    match packet.errors().len() {
        0 => {}
        1 => out.push_str(" [1 error]"),
        n => {
            let _ = write!(out, " [{n} errors]");
        }
    }

    out
}

fn endpoint(addr: &str, port: Option<u16>) -> String {
    match port {
        // Bracket IPv6 so the port separator is unambiguous
        Some(port) if addr.contains(':') => format!("[{addr}]:{port}"),
        Some(port) => format!("{addr}:{port}"),
        None => addr.to_string(),
    }
}

/// Multi-line dump of every layer's fields, then payload and errors.
pub fn details(packet: &DecodedPacket) -> String {
    let mut out = String::new();

    for layer in packet.layers() {
        let _ = writeln!(
            out,
            "{} (offset {}, {} bytes)",
            layer.tag(),
            layer.offset(),
            layer.header_len()
        );
        for (name, value) in layer.fields() {
            let _ = writeln!(out, "    {name}: {value}");
        }
    }

    let _ = writeln!(out, "Payload: {} bytes", packet.payload().len());

    if packet.has_errors() {
        let _ = writeln!(out, "Errors:");
        for err in packet.errors() {
            let _ = writeln!(out, "    {err}");
        }
    }

    out
}

/// Classic hex dump: offset, 16 hex bytes split in two groups, ASCII column.
///
/// ```text
/// 00000000  00 11 22 33 44 55 66 77  88 99 aa bb 08 00 45 00  |.."3DUfw......E.|
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(HEX_LINE_WIDTH) * 78);

    for (line, chunk) in data.chunks(HEX_LINE_WIDTH).enumerate() {
        let _ = write!(out, "{:08x} ", line * HEX_LINE_WIDTH);

        for i in 0..HEX_LINE_WIDTH {
            if i == HEX_LINE_WIDTH / 2 {
                out.push(' ');
            }
            match chunk.get(i) {
                Some(b) => {
                    let _ = write!(out, " {b:02x}");
                }
                None => out.push_str("   "),
            }
        }

        out.push_str("  |");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}
