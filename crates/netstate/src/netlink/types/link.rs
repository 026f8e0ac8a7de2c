//! Link (network interface) message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::impl_header;

/// Interface info message (struct ifinfomsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    /// Address family (usually AF_UNSPEC).
    pub ifi_family: u8,
    pub __ifi_pad: u8,
    /// Device type (ARPHRD_*).
    pub ifi_type: u16,
    /// Interface index.
    pub ifi_index: i32,
    /// Device flags (IFF_*).
    pub ifi_flags: u32,
    /// Change mask.
    pub ifi_change: u32,
}

impl_header!(IfInfoMsg);

impl IfInfoMsg {
    /// Create a new interface info message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.ifi_family = family;
        self
    }
}

/// IFLA_* attribute ids.
pub mod ifla {
    pub const ADDRESS: u16 = 1;
    pub const IFNAME: u16 = 3;
    pub const MTU: u16 = 4;
    pub const LINK: u16 = 5;
    pub const MASTER: u16 = 10;
    pub const TXQLEN: u16 = 13;
    pub const OPERSTATE: u16 = 16;
    pub const LINKINFO: u16 = 18;
    pub const NUM_VF: u16 = 21;
    pub const VFINFO_LIST: u16 = 22;
    pub const AF_SPEC: u16 = 26;
    pub const EXT_MASK: u16 = 29;
    pub const LINK_NETNSID: u16 = 37;
    pub const MIN_MTU: u16 = 50;
    pub const MAX_MTU: u16 = 51;
    pub const PERM_ADDRESS: u16 = 54;
}

/// Nested IFLA_INFO_* attribute ids.
pub mod ifla_info {
    pub const KIND: u16 = 1;
    pub const DATA: u16 = 2;
    pub const SLAVE_KIND: u16 = 4;
    pub const SLAVE_DATA: u16 = 5;
}

/// IFLA_EXT_MASK filter bits.
pub mod rtext_filter {
    pub const VF: u32 = 1 << 0;
    pub const BRVLAN: u32 = 1 << 1;
    pub const BRVLAN_COMPRESSED: u32 = 1 << 2;
}

/// Nested IFLA_INET6_* ids inside the AF_INET6 entry of IFLA_AF_SPEC.
pub mod ifla_inet6 {
    pub const TOKEN: u16 = 7;
    pub const ADDR_GEN_MODE: u16 = 8;
}

/// Bridge VLAN info inside IFLA_AF_SPEC of an AF_BRIDGE link dump.
pub mod ifla_bridge {
    pub const VLAN_INFO: u16 = 2;

    pub const VLAN_INFO_PVID: u16 = 1 << 1;
    pub const VLAN_INFO_UNTAGGED: u16 = 1 << 2;
    pub const VLAN_INFO_RANGE_BEGIN: u16 = 1 << 3;
    pub const VLAN_INFO_RANGE_END: u16 = 1 << 4;
}

/// Device flags (IFF_*).
pub mod iff {
    pub const UP: u32 = 0x1;
    pub const BROADCAST: u32 = 0x2;
    pub const DEBUG: u32 = 0x4;
    pub const LOOPBACK: u32 = 0x8;
    pub const POINTOPOINT: u32 = 0x10;
    pub const NOTRAILERS: u32 = 0x20;
    pub const RUNNING: u32 = 0x40;
    pub const NOARP: u32 = 0x80;
    pub const PROMISC: u32 = 0x100;
    pub const ALLMULTI: u32 = 0x200;
    pub const MASTER: u32 = 0x400;
    pub const SLAVE: u32 = 0x800;
    pub const MULTICAST: u32 = 0x1000;
    pub const PORTSEL: u32 = 0x2000;
    pub const AUTOMEDIA: u32 = 0x4000;
    pub const DYNAMIC: u32 = 0x8000;
    pub const LOWER_UP: u32 = 0x10000;
    pub const DORMANT: u32 = 0x20000;
    pub const ECHO: u32 = 0x40000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifinfomsg_size() {
        assert_eq!(IfInfoMsg::SIZE, 16);
    }

    #[test]
    fn test_ifinfomsg_roundtrip() {
        let mut msg = IfInfoMsg::new().with_family(7);
        msg.ifi_index = 3;
        let parsed = IfInfoMsg::from_bytes(msg.as_bytes()).unwrap();
        assert_eq!(parsed.ifi_family, 7);
        assert_eq!(parsed.ifi_index, 3);
        assert!(IfInfoMsg::from_bytes(&[0; 4]).is_err());
    }
}
