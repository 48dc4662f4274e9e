//! Decoded layer records.

use smallvec::SmallVec;

use super::{FieldValue, ProtocolTag};

/// A field entry: (name, value).
/// Field names are static strings from the parser definitions.
pub type FieldEntry = (&'static str, FieldValue);

/// One decoded protocol layer.
///
/// Fields keep insertion order, which is the order the header lays them
/// out. Most headers have fewer than 16 fields, so they stay inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    tag: ProtocolTag,
    offset: usize,
    header_len: usize,
    fields: SmallVec<[FieldEntry; 16]>,
}

impl LayerRecord {
    /// Create an empty record for a header of `header_len` bytes at `offset`.
    pub fn new(tag: ProtocolTag, offset: usize, header_len: usize) -> Self {
        Self {
            tag,
            offset,
            header_len,
            fields: SmallVec::new(),
        }
    }

    /// Append a field.
    #[inline]
    pub fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push((name, value));
    }

    /// Protocol this record was decoded as.
    pub fn tag(&self) -> ProtocolTag {
        self.tag
    }

    /// Offset of the header within the raw buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes this header consumed.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Offset of the first byte after this header.
    pub fn end(&self) -> usize {
        self.offset + self.header_len
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Get an integer field widened to u64.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(FieldValue::as_u64)
    }

    /// Get a 16-bit (or narrower) integer field.
    pub fn get_u16(&self, name: &str) -> Option<u16> {
        self.get(name).and_then(FieldValue::as_u16)
    }

    /// Get a text field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Look up a single flag inside a flag-mapping field.
    pub fn flag(&self, field: &str, flag: &str) -> Option<bool> {
        self.get(field)
            .and_then(FieldValue::as_flags)
            .and_then(|flags| flags.iter().find(|(n, _)| *n == flag).map(|(_, set)| *set))
    }

    /// Iterate over fields in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
