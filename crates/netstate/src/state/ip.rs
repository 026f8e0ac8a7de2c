use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::netlink::types::addr::ifa_flags;

/// Render an address lifetime in seconds.
///
/// `u32::MAX` is the kernel's "infinite" lifetime.
pub fn format_lifetime(secs: u32) -> String {
    if secs == u32::MAX {
        "forever".to_string()
    } else {
        format!("{secs}sec")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Info {
    pub addresses: Vec<Ipv4AddrInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4AddrInfo {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    /// Remote end of a point-to-point address.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peer: Option<Ipv4Addr>,
    pub valid_lft: String,
    pub preferred_lft: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6Info {
    pub addresses: Vec<Ipv6AddrInfo>,
    /// Interface identifier token, when one is configured.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<Ipv6Addr>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub addr_gen_mode: Option<Ipv6AddrGenMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6AddrInfo {
    pub address: Ipv6Addr,
    pub prefix_len: u8,
    pub valid_lft: String,
    pub preferred_lft: String,
    #[serde(default)]
    pub flags: Vec<Ipv6AddrFlag>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peer: Option<Ipv6Addr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ipv6AddrFlag {
    Secondary,
    Nodad,
    Optimistic,
    Dadfailed,
    Homeaddress,
    Deprecated,
    Tentative,
    Permanent,
    Managetempaddr,
    Noprefixroute,
    Mcautojoin,
    StablePrivacy,
    Other(u32),
}

const IFA_F_NAMES: &[(u32, Ipv6AddrFlag)] = &[
    (ifa_flags::SECONDARY, Ipv6AddrFlag::Secondary),
    (ifa_flags::NODAD, Ipv6AddrFlag::Nodad),
    (ifa_flags::OPTIMISTIC, Ipv6AddrFlag::Optimistic),
    (ifa_flags::DADFAILED, Ipv6AddrFlag::Dadfailed),
    (ifa_flags::HOMEADDRESS, Ipv6AddrFlag::Homeaddress),
    (ifa_flags::DEPRECATED, Ipv6AddrFlag::Deprecated),
    (ifa_flags::TENTATIVE, Ipv6AddrFlag::Tentative),
    (ifa_flags::PERMANENT, Ipv6AddrFlag::Permanent),
    (ifa_flags::MANAGETEMPADDR, Ipv6AddrFlag::Managetempaddr),
    (ifa_flags::NOPREFIXROUTE, Ipv6AddrFlag::Noprefixroute),
    (ifa_flags::MCAUTOJOIN, Ipv6AddrFlag::Mcautojoin),
    (ifa_flags::STABLE_PRIVACY, Ipv6AddrFlag::StablePrivacy),
];

impl Ipv6AddrFlag {
    /// Expand an IFA_F_* bitmask. Unnamed bits are kept as `Other`.
    pub fn from_bits(bits: u32) -> Vec<Self> {
        let mut known = 0u32;
        let mut flags: Vec<Self> = IFA_F_NAMES
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(bit, flag)| {
                known |= bit;
                *flag
            })
            .collect();
        let rest = bits & !known;
        for i in 0..32 {
            if rest & (1 << i) != 0 {
                flags.push(Self::Other(1 << i));
            }
        }
        flags
    }
}

/// IPv6 link-local address generation mode (IFLA_INET6_ADDR_GEN_MODE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ipv6AddrGenMode {
    Eui64,
    None,
    StablePrivacy,
    Random,
    Other(u8),
}

impl From<u8> for Ipv6AddrGenMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Eui64,
            1 => Self::None,
            2 => Self::StablePrivacy,
            3 => Self::Random,
            v => Self::Other(v),
        }
    }
}

/// Family of an address, route or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
    Other(u8),
}

impl From<u8> for AddressFamily {
    fn from(v: u8) -> Self {
        match v {
            2 => Self::Ipv4,
            10 => Self::Ipv6,
            v => Self::Other(v),
        }
    }
}

/// Render `addr/len`.
pub(crate) fn format_prefix(addr: IpAddr, len: u8) -> String {
    format!("{addr}/{len}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lifetime() {
        assert_eq!(format_lifetime(u32::MAX), "forever");
        assert_eq!(format_lifetime(3600), "3600sec");
        assert_eq!(format_lifetime(0), "0sec");
    }

    #[test]
    fn test_ipv6_flags_keep_unknown_bits() {
        let flags = Ipv6AddrFlag::from_bits(ifa_flags::PERMANENT | ifa_flags::NOPREFIXROUTE | 0x8000);
        assert_eq!(
            flags,
            vec![
                Ipv6AddrFlag::Permanent,
                Ipv6AddrFlag::Noprefixroute,
                Ipv6AddrFlag::Other(0x8000)
            ]
        );
    }

    #[test]
    fn test_addr_gen_mode_json() {
        assert_eq!(
            serde_json::to_string(&Ipv6AddrGenMode::from(2)).unwrap(),
            r#""stable_privacy""#
        );
        assert_eq!(Ipv6AddrGenMode::from(9), Ipv6AddrGenMode::Other(9));
    }

    #[test]
    fn test_ipv4_peer_omitted() {
        let addr = Ipv4AddrInfo {
            address: "192.0.2.10".parse().unwrap(),
            prefix_len: 24,
            peer: None,
            valid_lft: format_lifetime(u32::MAX),
            preferred_lft: format_lifetime(u32::MAX),
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["address"], "192.0.2.10");
        assert!(json.get("peer").is_none());
    }
}
