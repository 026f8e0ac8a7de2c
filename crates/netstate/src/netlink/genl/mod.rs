//! Generic Netlink (GENL) support.
//!
//! The snapshot reads two GENL families: `ethtool` for per-device settings
//! and `mptcp_pm` for the MPTCP path manager. Family ids are assigned at
//! runtime and resolved through the control family.

mod connection;
mod header;

pub use connection::{FamilyInfo, GenlConnection};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// Control family id (fixed, not dynamically assigned).
pub const GENL_ID_CTRL: u16 = 0x10;

/// Control family commands used for family resolution.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    GetFamily = 3,
}

/// Control family attributes read from a CTRL_CMD_GETFAMILY reply.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    MaxAttr = 5,
}
