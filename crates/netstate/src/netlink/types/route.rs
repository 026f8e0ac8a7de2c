//! Route message types.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::impl_header;

/// Route message (struct rtmsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtMsg {
    pub rtm_family: u8,
    pub rtm_dst_len: u8,
    pub rtm_src_len: u8,
    pub rtm_tos: u8,
    pub rtm_table: u8,
    pub rtm_protocol: u8,
    pub rtm_scope: u8,
    pub rtm_type: u8,
    pub rtm_flags: u32,
}

impl_header!(RtMsg);

impl RtMsg {
    /// Create a new route message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address family.
    pub fn with_family(mut self, family: u8) -> Self {
        self.rtm_family = family;
        self
    }
}

/// Next hop entry inside RTA_MULTIPATH (struct rtnexthop).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtNextHop {
    pub rtnh_len: u16,
    pub rtnh_flags: u8,
    pub rtnh_hops: u8,
    pub rtnh_ifindex: i32,
}

impl_header!(RtNextHop);

/// Route cache info (struct rta_cacheinfo).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RtaCacheInfo {
    pub rta_clntref: u32,
    pub rta_lastuse: u32,
    pub rta_expires: i32,
    pub rta_error: u32,
    pub rta_used: u32,
    pub rta_id: u32,
    pub rta_ts: u32,
    pub rta_tsage: u32,
}

impl_header!(RtaCacheInfo);

/// RTA_* attribute ids.
pub mod rta {
    pub const DST: u16 = 1;
    pub const SRC: u16 = 2;
    pub const IIF: u16 = 3;
    pub const OIF: u16 = 4;
    pub const GATEWAY: u16 = 5;
    pub const PRIORITY: u16 = 6;
    pub const PREFSRC: u16 = 7;
    pub const METRICS: u16 = 8;
    pub const MULTIPATH: u16 = 9;
    pub const FLOW: u16 = 11;
    pub const CACHEINFO: u16 = 12;
    pub const TABLE: u16 = 15;
    pub const MARK: u16 = 16;
    pub const VIA: u16 = 18;
    pub const PREF: u16 = 20;
    pub const UID: u16 = 25;
}

/// RTAX_* metric ids nested in RTA_METRICS.
pub mod rtax {
    pub const LOCK: u16 = 1;
    pub const MTU: u16 = 2;
    pub const WINDOW: u16 = 3;
    pub const RTT: u16 = 4;
    pub const RTTVAR: u16 = 5;
    pub const SSTHRESH: u16 = 6;
    pub const CWND: u16 = 7;
    pub const ADVMSS: u16 = 8;
    pub const REORDERING: u16 = 9;
    pub const HOPLIMIT: u16 = 10;
    pub const INITCWND: u16 = 11;
    pub const FEATURES: u16 = 12;
    pub const RTO_MIN: u16 = 13;
    pub const INITRWND: u16 = 14;
    pub const QUICKACK: u16 = 15;
    pub const CC_ALGO: u16 = 16;
    pub const FASTOPEN_NO_COOKIE: u16 = 17;
}

/// RTM_F_* and RTNH_F_* flags.
pub mod route_flags {
    pub const RTNH_F_DEAD: u32 = 1;
    pub const RTNH_F_PERVASIVE: u32 = 2;
    pub const RTNH_F_ONLINK: u32 = 4;
    pub const RTNH_F_OFFLOAD: u32 = 8;
    pub const RTNH_F_LINKDOWN: u32 = 16;
    pub const RTNH_F_UNRESOLVED: u32 = 32;
    pub const RTNH_F_TRAP: u32 = 64;
    pub const RTM_F_NOTIFY: u32 = 0x100;
    pub const RTM_F_CLONED: u32 = 0x200;
    pub const RTM_F_EQUALIZE: u32 = 0x400;
    pub const RTM_F_PREFIX: u32 = 0x800;
    pub const RTM_F_LOOKUP_TABLE: u32 = 0x1000;
    pub const RTM_F_FIB_MATCH: u32 = 0x2000;
    pub const RTM_F_OFFLOAD: u32 = 0x4000;
    pub const RTM_F_TRAP: u32 = 0x8000;
}

/// Kernel clock ticks per second for RTA_CACHEINFO expiry.
pub const USER_HZ: i32 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_sizes() {
        assert_eq!(RtMsg::SIZE, 12);
        assert_eq!(RtNextHop::SIZE, 8);
        assert_eq!(RtaCacheInfo::SIZE, 32);
    }
}
