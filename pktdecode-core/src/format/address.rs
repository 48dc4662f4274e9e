//! Network address formatting.
//!
//! All formatters take fixed-size arrays, so they cannot fail: the length
//! check lives with the caller that slices the packet.

use std::net::{Ipv4Addr, Ipv6Addr};

use compact_str::{format_compact, CompactString, ToCompactString};

/// Format 4 bytes as an IPv4 address string in dotted-decimal notation.
///
/// # Example
///
/// ```
/// use pktdecode_core::format::format_ipv4;
///
/// assert_eq!(format_ipv4([192, 168, 1, 1]), "192.168.1.1");
/// assert_eq!(format_ipv4([10, 0, 0, 1]), "10.0.0.1");
/// ```
pub fn format_ipv4(octets: [u8; 4]) -> CompactString {
    Ipv4Addr::from(octets).to_compact_string()
}

/// Format 16 bytes as an IPv6 address string (RFC 5952 compressed form).
///
/// # Example
///
/// ```
/// use pktdecode_core::format::format_ipv6;
///
/// let bytes = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
/// assert_eq!(format_ipv6(bytes), "2001:db8::1");
/// ```
pub fn format_ipv6(octets: [u8; 16]) -> CompactString {
    Ipv6Addr::from(octets).to_compact_string()
}

/// Format 6 bytes as a MAC address string in colon-separated lowercase hex.
///
/// # Example
///
/// ```
/// use pktdecode_core::format::format_mac;
///
/// let bytes = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
/// assert_eq!(format_mac(&bytes), "aa:bb:cc:dd:ee:ff");
/// ```
pub fn format_mac(bytes: &[u8; 6]) -> CompactString {
    format_compact!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        bytes[0],
        bytes[1],
        bytes[2],
        bytes[3],
        bytes[4],
        bytes[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ipv4() {
        assert_eq!(format_ipv4([192, 168, 0, 1]), "192.168.0.1");
        assert_eq!(format_ipv4([0, 0, 0, 0]), "0.0.0.0");
        assert_eq!(format_ipv4([255, 255, 255, 255]), "255.255.255.255");
    }

    #[test]
    fn test_format_ipv6() {
        assert_eq!(format_ipv6([0; 16]), "::");

        let link_local = [0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0x02, 0x11, 0x22, 0xff, 0xfe, 0x33, 0x44, 0x55];
        assert_eq!(format_ipv6(link_local), "fe80::211:22ff:fe33:4455");
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0xff; 6]), "ff:ff:ff:ff:ff:ff");
        assert_eq!(
            format_mac(&[0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB]),
            "66:77:88:99:aa:bb"
        );
    }
}
