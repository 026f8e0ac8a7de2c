//! Generic Netlink message header.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ nlmsghdr (16 bytes)                     │
//! │   nlmsg_type carries the family id      │
//! ├─────────────────────────────────────────┤
//! │ genlmsghdr (4 bytes)                    │
//! │   cmd (u8), version (u8), reserved (u16)│
//! ├─────────────────────────────────────────┤
//! │ Attributes (TLV format)                 │
//! └─────────────────────────────────────────┘
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Generic Netlink message header (struct genlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct GenlMsgHdr {
    /// Command identifier (family-specific)
    pub cmd: u8,
    /// Interface version
    pub version: u8,
    pub reserved: u16,
}

/// Size of the GENL header in bytes.
pub const GENL_HDRLEN: usize = std::mem::size_of::<GenlMsgHdr>();

impl GenlMsgHdr {
    /// Create a new GENL header with the given command and version.
    #[inline]
    pub const fn new(cmd: u8, version: u8) -> Self {
        Self {
            cmd,
            version,
            reserved: 0,
        }
    }

    /// Read a header off the front of a payload.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        Self::read_from_prefix(data).ok().map(|(hdr, _)| hdr)
    }

    /// The attribute stream following the header.
    pub fn attrs(payload: &[u8]) -> &[u8] {
        payload.get(GENL_HDRLEN..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genl_header_size() {
        assert_eq!(GENL_HDRLEN, 4);
    }

    #[test]
    fn test_genl_header_from_bytes() {
        let data = [0x03, 0x01, 0x00, 0x00, 0xaa];
        let hdr = GenlMsgHdr::from_bytes(&data).unwrap();
        assert_eq!(hdr.cmd, 3);
        assert_eq!(hdr.version, 1);
        assert_eq!(GenlMsgHdr::attrs(&data), &[0xaa]);
    }

    #[test]
    fn test_genl_header_from_bytes_too_short() {
        assert!(GenlMsgHdr::from_bytes(&[0x03, 0x01, 0x00]).is_none());
        assert!(GenlMsgHdr::attrs(&[0x03]).is_empty());
    }
}
