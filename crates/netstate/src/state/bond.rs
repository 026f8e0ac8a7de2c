use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondMode {
    #[default]
    #[serde(rename = "balance-rr")]
    BalanceRoundRobin,
    #[serde(rename = "active-backup")]
    ActiveBackup,
    #[serde(rename = "balance-xor")]
    BalanceXor,
    #[serde(rename = "broadcast")]
    Broadcast,
    #[serde(rename = "802.3ad")]
    Ieee8021Ad,
    #[serde(rename = "balance-tlb")]
    BalanceTlb,
    #[serde(rename = "balance-alb")]
    BalanceAlb,
    #[serde(rename = "other")]
    Other(u8),
}

impl From<u8> for BondMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::BalanceRoundRobin,
            1 => Self::ActiveBackup,
            2 => Self::BalanceXor,
            3 => Self::Broadcast,
            4 => Self::Ieee8021Ad,
            5 => Self::BalanceTlb,
            6 => Self::BalanceAlb,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondArpValidate {
    None,
    Active,
    Backup,
    All,
    Filter,
    FilterActive,
    FilterBackup,
    Other(u32),
}

impl From<u32> for BondArpValidate {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::None,
            1 => Self::Active,
            2 => Self::Backup,
            3 => Self::All,
            4 => Self::Filter,
            5 => Self::FilterActive,
            6 => Self::FilterBackup,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondArpAllTargets {
    Any,
    All,
    Other(u32),
}

impl From<u32> for BondArpAllTargets {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Any,
            1 => Self::All,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondPrimaryReselect {
    Always,
    Better,
    Failure,
    Other(u8),
}

impl From<u8> for BondPrimaryReselect {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Always,
            1 => Self::Better,
            2 => Self::Failure,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondFailOverMac {
    None,
    Active,
    Follow,
    Other(u8),
}

impl From<u8> for BondFailOverMac {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::Active,
            2 => Self::Follow,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondXmitHashPolicy {
    #[serde(rename = "layer2")]
    Layer2,
    #[serde(rename = "layer3+4")]
    Layer34,
    #[serde(rename = "layer2+3")]
    Layer23,
    #[serde(rename = "encap2+3")]
    Encap23,
    #[serde(rename = "encap3+4")]
    Encap34,
    #[serde(rename = "vlan+srcmac")]
    VlanSrcMac,
    #[serde(rename = "other")]
    Other(u8),
}

impl From<u8> for BondXmitHashPolicy {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Layer2,
            1 => Self::Layer34,
            2 => Self::Layer23,
            3 => Self::Encap23,
            4 => Self::Encap34,
            5 => Self::VlanSrcMac,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondAllSubordinatesActive {
    Dropped,
    Delivered,
    Other(u8),
}

impl From<u8> for BondAllSubordinatesActive {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Dropped,
            1 => Self::Delivered,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondLacpRate {
    Slow,
    Fast,
    Other(u8),
}

impl From<u8> for BondLacpRate {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Slow,
            1 => Self::Fast,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondAdSelect {
    Stable,
    Bandwidth,
    Count,
    Other(u8),
}

impl From<u8> for BondAdSelect {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Stable,
            1 => Self::Bandwidth,
            2 => Self::Count,
            v => Self::Other(v),
        }
    }
}

/// Active 802.3ad aggregator (IFLA_BOND_AD_INFO).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondAdInfo {
    pub aggregator: u16,
    pub num_ports: u16,
    pub actor_key: u16,
    pub partner_key: u16,
    pub partner_mac: String,
}

/// Bond controller settings.
///
/// Options the kernel only honours in some modes are reported only for
/// those modes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondInfo {
    /// Sorted names of the enslaved interfaces.
    #[serde(default)]
    pub subordinates: Vec<String>,
    pub mode: BondMode,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub miimon: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updelay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub downdelay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_carrier: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arp_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arp_ip_target: Option<Vec<Ipv4Addr>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arp_all_targets: Option<BondArpAllTargets>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arp_validate: Option<BondArpValidate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub arp_missed_max: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ns_ip6_target: Option<Vec<Ipv6Addr>>,
    /// Primary subordinate name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub primary_reselect: Option<BondPrimaryReselect>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fail_over_mac: Option<BondFailOverMac>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub xmit_hash_policy: Option<BondXmitHashPolicy>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resend_igmp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_unsol_na: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_grat_arp: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub all_subordinates_active: Option<BondAllSubordinatesActive>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_links: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lp_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub packets_per_subordinate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peer_notif_delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tlb_dynamic_lb: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lacp_rate: Option<BondLacpRate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lacp_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_select: Option<BondAdSelect>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_actor_sys_prio: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_user_port_key: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_actor_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_info: Option<BondAdInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondSubordinateState {
    #[default]
    Active,
    Backup,
    Other(u8),
}

impl From<u8> for BondSubordinateState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Active,
            1 => Self::Backup,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondMiiStatus {
    LinkUp,
    LinkFail,
    LinkDown,
    LinkBack,
    #[default]
    Unknown,
    Other(u8),
}

impl From<u8> for BondMiiStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::LinkUp,
            1 => Self::LinkFail,
            2 => Self::LinkDown,
            3 => Self::LinkBack,
            v => Self::Other(v),
        }
    }
}

/// Per-subordinate bonding status (IFLA_INFO_SLAVE_DATA of a bond port).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondSubordinateInfo {
    pub subordinate_state: BondSubordinateState,
    pub mii_status: BondMiiStatus,
    pub link_failure_count: u32,
    pub perm_hwaddr: String,
    pub queue_id: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prio: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_aggregator_id: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_actor_oper_port_state: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ad_partner_oper_port_state: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bond_mode_names() {
        assert_eq!(
            serde_json::to_string(&BondMode::from(1)).unwrap(),
            r#""active-backup""#
        );
        assert_eq!(
            serde_json::to_string(&BondMode::from(4)).unwrap(),
            r#""802.3ad""#
        );
    }

    #[test]
    fn test_xmit_hash_names() {
        assert_eq!(
            serde_json::to_string(&BondXmitHashPolicy::from(1)).unwrap(),
            r#""layer3+4""#
        );
    }

    #[test]
    fn test_subordinate_enums() {
        assert_eq!(BondSubordinateState::from(1), BondSubordinateState::Backup);
        assert_eq!(BondMiiStatus::from(0), BondMiiStatus::LinkUp);
        assert_eq!(
            serde_json::to_string(&BondMiiStatus::LinkFail).unwrap(),
            r#""link_fail""#
        );
    }
}
