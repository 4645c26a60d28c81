//! Netlink attribute (nlattr) decoding.
//!
//! Two ways to walk an attribute stream:
//!
//! - [`AttrIter`] yields `(type, payload)` pairs in wire order, which suits
//!   nested arrays whose attribute type is only an index.
//! - [`AttrTable`] mirrors the kernel's `nla_parse`: it places every
//!   attribute into a fixed-size table indexed by attribute type so adapters
//!   can read fields by constant after a single pass. Attribute types beyond
//!   the table size are ignored, and a repeated type keeps the last payload.

use crate::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Netlink attribute header (mirrors struct nlattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

/// Attribute type flags.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Create a new attribute header.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the attribute type without flags.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Iterator over netlink attributes in a buffer.
///
/// Iteration stops at the first malformed header; trailing garbage is
/// ignored rather than reported.
#[derive(Debug, Clone)]
pub struct AttrIter<'a> {
    data: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Create a new attribute iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    /// Returns (attribute type, payload data).
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (attr, _) = NlAttr::read_from_prefix(self.data).ok()?;

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            self.data = &[];
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);
        self.data = self.data.get(aligned_len..).unwrap_or(&[]);

        Some((attr.kind(), payload))
    }
}

/// Attribute payloads indexed by attribute type.
///
/// `N` is the table size, i.e. the family's `*_MAX + 1`.
#[derive(Debug, Clone)]
pub struct AttrTable<'a, const N: usize> {
    slots: [Option<&'a [u8]>; N],
}

impl<'a, const N: usize> AttrTable<'a, N> {
    /// Parse an attribute stream into a table.
    pub fn parse(data: &'a [u8]) -> Self {
        let mut slots = [None; N];
        for (kind, payload) in AttrIter::new(data) {
            if let Some(slot) = slots.get_mut(kind as usize) {
                *slot = Some(payload);
            }
        }
        Self { slots }
    }

    /// Raw payload of an attribute, if present.
    pub fn get(&self, kind: u16) -> Option<&'a [u8]> {
        self.slots.get(kind as usize).copied().flatten()
    }

    /// Whether an attribute is present. Used for flag attributes.
    pub fn has(&self, kind: u16) -> bool {
        self.get(kind).is_some()
    }

    /// Read a u8 attribute, `None` if absent or truncated.
    pub fn u8(&self, kind: u16) -> Option<u8> {
        self.get(kind).and_then(|p| get::u8(p).ok())
    }

    /// Read a native-endian u16 attribute.
    pub fn u16(&self, kind: u16) -> Option<u16> {
        self.get(kind).and_then(|p| get::u16_ne(p).ok())
    }

    /// Read a native-endian u32 attribute.
    pub fn u32(&self, kind: u16) -> Option<u32> {
        self.get(kind).and_then(|p| get::u32_ne(p).ok())
    }

    /// Read a native-endian u64 attribute.
    pub fn u64(&self, kind: u16) -> Option<u64> {
        self.get(kind).and_then(|p| get::u64_ne(p).ok())
    }

    /// Read a string attribute as an owned `String`.
    pub fn string(&self, kind: u16) -> Option<String> {
        self.get(kind)
            .and_then(|p| get::string(p).ok())
            .map(str::to_string)
    }

    /// Iterate the children of a nested attribute.
    pub fn nested(&self, kind: u16) -> AttrIter<'a> {
        AttrIter::new(self.get(kind).unwrap_or(&[]))
    }

    /// Parse a nested attribute into its own table.
    pub fn nested_table<const M: usize>(&self, kind: u16) -> Option<AttrTable<'a, M>> {
        self.get(kind).map(AttrTable::parse)
    }
}

/// Helper functions for extracting typed values from attribute payloads.
pub mod get {
    use super::*;

    /// Extract a u8 value.
    pub fn u8(data: &[u8]) -> Result<u8> {
        data.first()
            .copied()
            .ok_or_else(|| Error::InvalidAttribute("empty u8 attribute".into()))
    }

    /// Extract a u16 value (native endian).
    pub fn u16_ne(data: &[u8]) -> Result<u16> {
        fixed::<2>(data, "u16").map(u16::from_ne_bytes)
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        fixed::<4>(data, "u32").map(u32::from_ne_bytes)
    }

    /// Extract a u64 value (native endian).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        fixed::<8>(data, "u64").map(u64::from_ne_bytes)
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }

    /// Extract an array of native-endian u32 values (e.g. cipher suites).
    ///
    /// A trailing partial element is ignored.
    pub fn u32_array(data: &[u8]) -> Vec<u32> {
        data.chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn fixed<const W: usize>(data: &[u8], what: &str) -> Result<[u8; W]> {
        data.get(..W)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::InvalidAttribute(format!("truncated {} attribute", what)))
    }
}
