use serde::{Deserialize, Serialize};

use super::{AddressFamily, RouteProtocol, RouteRealm};

/// FR_ACT_* rule action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Unspec,
    Table,
    Goto,
    Nop,
    Blackhole,
    Unreachable,
    Prohibit,
    Other(u8),
}

impl From<u8> for RuleAction {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unspec,
            1 => Self::Table,
            2 => Self::Goto,
            3 => Self::Nop,
            6 => Self::Blackhole,
            7 => Self::Unreachable,
            8 => Self::Prohibit,
            v => Self::Other(v),
        }
    }
}

/// IP protocol matched by FRA_IP_PROTO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Icmpv6,
    Sctp,
    Other(u8),
}

impl From<u8> for IpProtocol {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Icmp,
            6 => Self::Tcp,
            17 => Self::Udp,
            58 => Self::Icmpv6,
            132 => Self::Sctp,
            v => Self::Other(v),
        }
    }
}

/// One policy routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub action: RuleAction,
    pub address_family: AddressFamily,
    pub flags: u32,
    pub tos: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub table: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub oif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goto: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fw_mark: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fw_mask: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub realm: Option<RouteRealm>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tun_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suppress_ifgroup: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suppress_prefix_len: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protocol: Option<RouteProtocol>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ip_proto: Option<IpProtocol>,
    /// `"start-end"`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub src_port_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dst_port_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub l3mdev: Option<bool>,
}

impl RouteRule {
    pub fn new(action: RuleAction, address_family: AddressFamily) -> Self {
        Self {
            action,
            address_family,
            flags: 0,
            tos: 0,
            table: None,
            dst: None,
            src: None,
            iif: None,
            oif: None,
            goto: None,
            priority: None,
            fw_mark: None,
            fw_mask: None,
            realm: None,
            tun_id: None,
            suppress_ifgroup: None,
            suppress_prefix_len: None,
            protocol: None,
            ip_proto: None,
            src_port_range: None,
            dst_port_range: None,
            l3mdev: None,
        }
    }
}
