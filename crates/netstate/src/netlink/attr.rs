//! Netlink attribute (rtattr/nlattr) handling.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::error::{Error, Result};
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

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
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

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Iterator over netlink attributes in a buffer.
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
        if self.data.len() < NLA_HDRLEN {
            return None;
        }

        let attr = NlAttr::from_bytes(self.data).ok()?;

        let len = attr.nla_len as usize;
        if len < NLA_HDRLEN || len > self.data.len() {
            return None;
        }

        let payload = &self.data[NLA_HDRLEN..len];
        let aligned_len = nla_align(len);

        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some((attr.kind(), payload))
    }
}

/// Attributes of one nest, indexed by type.
///
/// Type decoders look fields up by id rather than walking the buffer, so a
/// missing required field is a single `get` returning `None`. Later
/// duplicates win, matching the kernel's "last attribute" semantics.
#[derive(Debug, Default, Clone)]
pub struct AttrMap<'a> {
    attrs: HashMap<u16, &'a [u8]>,
}

impl<'a> AttrMap<'a> {
    /// Index every attribute in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            attrs: AttrIter::new(data).collect(),
        }
    }

    /// Raw payload of an attribute.
    pub fn get(&self, kind: u16) -> Option<&'a [u8]> {
        self.attrs.get(&kind).copied()
    }

    /// Whether the attribute is present (used for flag attributes).
    pub fn has(&self, kind: u16) -> bool {
        self.attrs.contains_key(&kind)
    }

    pub fn u8(&self, kind: u16) -> Option<u8> {
        self.get(kind).and_then(|d| get::u8(d).ok())
    }

    pub fn bool(&self, kind: u16) -> Option<bool> {
        self.u8(kind).map(|v| v != 0)
    }

    pub fn u16(&self, kind: u16) -> Option<u16> {
        self.get(kind).and_then(|d| get::u16_ne(d).ok())
    }

    pub fn u16_be(&self, kind: u16) -> Option<u16> {
        self.get(kind).and_then(|d| get::u16_be(d).ok())
    }

    pub fn u32(&self, kind: u16) -> Option<u32> {
        self.get(kind).and_then(|d| get::u32_ne(d).ok())
    }

    pub fn u64(&self, kind: u16) -> Option<u64> {
        self.get(kind).and_then(|d| get::u64_ne(d).ok())
    }

    pub fn string(&self, kind: u16) -> Option<String> {
        self.get(kind)
            .and_then(|d| get::string(d).ok())
            .map(str::to_string)
    }

    pub fn ip(&self, kind: u16) -> Option<IpAddr> {
        self.get(kind).and_then(get::ip_addr)
    }

    pub fn mac(&self, kind: u16) -> Option<String> {
        self.get(kind).map(get::mac)
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
        if data.len() < 2 {
            return Err(Error::InvalidAttribute("truncated u16 attribute".into()));
        }
        Ok(u16::from_ne_bytes([data[0], data[1]]))
    }

    /// Extract a u32 value (native endian).
    pub fn u32_ne(data: &[u8]) -> Result<u32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated u32 attribute".into()));
        }
        Ok(u32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a u64 value (native endian).
    pub fn u64_ne(data: &[u8]) -> Result<u64> {
        if data.len() < 8 {
            return Err(Error::InvalidAttribute("truncated u64 attribute".into()));
        }
        Ok(u64::from_ne_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ]))
    }

    /// Extract a u16 value (big endian / network order).
    pub fn u16_be(data: &[u8]) -> Result<u16> {
        if data.len() < 2 {
            return Err(Error::InvalidAttribute("truncated u16 attribute".into()));
        }
        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    /// Extract an i32 value (native endian).
    pub fn i32_ne(data: &[u8]) -> Result<i32> {
        if data.len() < 4 {
            return Err(Error::InvalidAttribute("truncated i32 attribute".into()));
        }
        Ok(i32::from_ne_bytes([data[0], data[1], data[2], data[3]]))
    }

    /// Extract a null-terminated string.
    pub fn string(data: &[u8]) -> Result<&str> {
        let len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        std::str::from_utf8(&data[..len])
            .map_err(|e| Error::InvalidAttribute(format!("invalid UTF-8: {}", e)))
    }

    /// Interpret a 4 or 16 byte payload as an IP address.
    pub fn ip_addr(data: &[u8]) -> Option<IpAddr> {
        match data.len() {
            4 => {
                let octets: [u8; 4] = data.try_into().ok()?;
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            16 => {
                let octets: [u8; 16] = data.try_into().ok()?;
                Some(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            _ => None,
        }
    }

    /// Format a hardware address as colon separated upper-case hex.
    pub fn mac(data: &[u8]) -> String {
        data.iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;

    #[test]
    fn test_attr_iter_skips_padding() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_str(3, "lo");
            b.append_attr_u32(4, 65536);
        });
        let attrs: Vec<_> = AttrIter::new(&data).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, 3);
        assert_eq!(get::string(attrs[0].1).unwrap(), "lo");
        assert_eq!(get::u32_ne(attrs[1].1).unwrap(), 65536);
    }

    #[test]
    fn test_attr_map_nested_flag_masked() {
        let data = MessageBuilder::attrs(|b| {
            let nest = b.nest_start(18);
            b.append_attr_str(1, "bond");
            b.nest_end(nest);
        });
        let map = AttrMap::new(&data);
        let info = AttrMap::new(map.get(18).unwrap());
        assert_eq!(info.string(1).as_deref(), Some("bond"));
    }

    #[test]
    fn test_mac_format() {
        assert_eq!(get::mac(&[0x52, 0x54, 0x00, 0xab, 0x0c, 0x01]), "52:54:00:AB:0C:01");
        assert_eq!(get::mac(&[]), "");
    }

    #[test]
    fn test_ip_addr_lengths() {
        assert_eq!(
            get::ip_addr(&[192, 0, 2, 1]),
            Some("192.0.2.1".parse().unwrap())
        );
        assert!(get::ip_addr(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_truncated_values() {
        assert!(get::u32_ne(&[1, 2]).is_err());
        assert!(get::u8(&[]).is_err());
    }
}
