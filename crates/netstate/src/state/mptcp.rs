use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Host-wide MPTCP path manager state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mptcp {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub add_addr_accepted_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subflows_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub addresses: Option<Vec<MptcpAddress>>,
}

/// One path manager endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MptcpAddress {
    pub address: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub flags: Option<Vec<MptcpAddressFlag>>,
    /// Bound interface name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iface: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MptcpAddressFlag {
    Signal,
    Subflow,
    Backup,
    Fullmesh,
    Implicit,
    Other(u32),
}

const MPTCP_FLAG_NAMES: &[(u32, MptcpAddressFlag)] = &[
    (1, MptcpAddressFlag::Signal),
    (2, MptcpAddressFlag::Subflow),
    (4, MptcpAddressFlag::Backup),
    (8, MptcpAddressFlag::Fullmesh),
    (16, MptcpAddressFlag::Implicit),
];

impl MptcpAddressFlag {
    pub fn from_bits(bits: u32) -> Vec<Self> {
        let mut flags: Vec<Self> = MPTCP_FLAG_NAMES
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, f)| *f)
            .collect();
        let rest = bits & !0x1f;
        if rest != 0 {
            flags.push(Self::Other(rest));
        }
        flags
    }
}
