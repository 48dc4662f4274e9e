//! Field value types for decoded layers.
//!
//! A [`LayerRecord`](super::LayerRecord) holds an ordered list of named
//! `FieldValue`s. Values are integers, names from static lookup tables,
//! formatted address text, or flag mappings.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::format::{format_ipv4, format_ipv6, format_mac};

/// Ordered flag mapping (flag name -> set).
pub type FlagSet = SmallVec<[(&'static str, bool); 9]>;

/// Possible field value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Unsigned 8-bit integer
    UInt8(u8),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Boolean value
    Bool(bool),
    /// Name from a static lookup table (protocol names, ICMP types, ...).
    Str(&'static str),
    /// Constructed text: formatted addresses and "Unknown (0x....)" names.
    /// Uses CompactString so short addresses stay inline.
    Text(CompactString),
    /// Flag mapping in bit order.
    Flags(FlagSet),
}

impl FieldValue {
    /// Format 6 bytes as a colon-separated MAC address.
    pub fn mac(bytes: [u8; 6]) -> Self {
        FieldValue::Text(format_mac(&bytes))
    }

    /// Format 4 bytes as a dotted-quad IPv4 address.
    pub fn ipv4(bytes: [u8; 4]) -> Self {
        FieldValue::Text(format_ipv4(bytes))
    }

    /// Format 16 bytes as an IPv6 address.
    pub fn ipv6(bytes: [u8; 16]) -> Self {
        FieldValue::Text(format_ipv6(bytes))
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(*v as u64),
            FieldValue::UInt16(v) => Some(*v as u64),
            FieldValue::UInt32(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Try to get as u16.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::UInt16(v) => Some(*v),
            FieldValue::UInt8(v) => Some(*v as u16),
            _ => None,
        }
    }

    /// Try to get as str reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get as a flag mapping.
    pub fn as_flags(&self) -> Option<&[(&'static str, bool)]> {
        match self {
            FieldValue::Flags(flags) => Some(flags.as_slice()),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::UInt8(v) => write!(f, "{v}"),
            FieldValue::UInt16(v) => write!(f, "{v}"),
            FieldValue::UInt32(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Flags(flags) => {
                // Only the set flags, e.g. "[SYN, ACK]"
                write!(f, "[")?;
                let mut first = true;
                for (name, set) in flags.iter() {
                    if !*set {
                        continue;
                    }
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}")?;
                    first = false;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_constructors() {
        assert_eq!(
            FieldValue::mac([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]).as_str(),
            Some("00:11:22:33:44:55")
        );
        assert_eq!(FieldValue::ipv4([10, 0, 0, 1]).as_str(), Some("10.0.0.1"));

        let mut v6 = [0u8; 16];
        v6[15] = 1;
        assert_eq!(FieldValue::ipv6(v6).as_str(), Some("::1"));
    }

    #[test]
    fn test_integer_accessors() {
        assert_eq!(FieldValue::UInt8(6).as_u64(), Some(6));
        assert_eq!(FieldValue::UInt32(0xdead_beef).as_u64(), Some(0xdead_beef));
        assert_eq!(FieldValue::UInt32(1).as_u16(), None);
        assert_eq!(FieldValue::Str("TCP").as_u64(), None);
    }

    #[test]
    fn test_flags_display_only_set() {
        let mut flags = FlagSet::new();
        flags.push(("FIN", false));
        flags.push(("SYN", true));
        flags.push(("ACK", true));
        let value = FieldValue::Flags(flags);

        assert_eq!(value.to_string(), "[SYN, ACK]");
        assert_eq!(value.as_flags().map(|f| f.len()), Some(3));
    }
}
