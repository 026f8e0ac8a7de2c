use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStpState {
    Disabled,
    KernelStp,
    UserStp,
    Other(u32),
}

impl From<u32> for BridgeStpState {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Disabled,
            1 => Self::KernelStp,
            2 => Self::UserStp,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeVlanProtocol {
    #[serde(rename = "802.1q")]
    Ieee8021Q,
    #[serde(rename = "802.1ad")]
    Ieee8021Ad,
    #[serde(rename = "other")]
    Other(u16),
}

impl From<u16> for BridgeVlanProtocol {
    fn from(v: u16) -> Self {
        match v {
            0x8100 => Self::Ieee8021Q,
            0x88a8 => Self::Ieee8021Ad,
            v => Self::Other(v),
        }
    }
}

/// Bridge controller settings (IFLA_BR_*).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeInfo {
    /// Sorted names of the attached ports.
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stp_state: Option<BridgeStpState>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hello_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub forward_delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ageing_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<u16>,
    /// `prio.address`, as sysfs renders it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bridge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub root_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub root_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub root_path_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topology_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topology_change_detected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hello_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tcn_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topology_change_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gc_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_fwd_mask: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vlan_filtering: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vlan_protocol: Option<BridgeVlanProtocol>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_pvid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub multicast_snooping: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub multicast_querier: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nf_call_iptables: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nf_call_ip6tables: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nf_call_arptables: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgePortStpState {
    #[default]
    Disabled,
    Listening,
    Learning,
    Forwarding,
    Blocking,
    Other(u8),
}

impl From<u8> for BridgePortStpState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Disabled,
            1 => Self::Listening,
            2 => Self::Learning,
            3 => Self::Forwarding,
            4 => Self::Blocking,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgePortMulticastRouterType {
    Disabled,
    TempQuery,
    Perm,
    Temp,
    #[default]
    Unknown,
    Other(u8),
}

impl From<u8> for BridgePortMulticastRouterType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Disabled,
            1 => Self::TempQuery,
            2 => Self::Perm,
            3 => Self::Temp,
            v => Self::Other(v),
        }
    }
}

/// One VLAN (or compressed VLAN range) on a bridge or bridge port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeVlanEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vid_range: Option<(u16, u16)>,
    /// PVID and ingress untagged.
    pub is_pvid: bool,
    pub is_egress_untagged: bool,
}

/// Bridge port status (IFLA_INFO_SLAVE_DATA of a bridge port).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgePortInfo {
    pub stp_state: BridgePortStpState,
    pub stp_priority: u16,
    pub stp_path_cost: u32,
    pub hairpin_mode: bool,
    pub bpdu_guard: bool,
    pub root_block: bool,
    pub multicast_fast_leave: bool,
    pub learning: bool,
    pub unicast_flood: bool,
    pub proxyarp: bool,
    pub proxyarp_wifi: bool,
    pub designated_root: String,
    pub designated_bridge: String,
    pub designated_port: u16,
    pub designated_cost: u16,
    pub port_id: String,
    pub port_no: String,
    pub change_ack: bool,
    pub config_pending: bool,
    pub message_age_timer: u64,
    pub forward_delay_timer: u64,
    pub hold_timer: u64,
    pub multicast_router: BridgePortMulticastRouterType,
    pub multicast_flood: bool,
    pub multicast_to_unicast: bool,
    pub vlan_tunnel: bool,
    pub broadcast_flood: bool,
    pub group_fwd_mask: u16,
    pub neigh_suppress: bool,
    pub isolated: bool,
    /// Failover port name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub backup_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vlans: Option<Vec<BridgeVlanEntry>>,
}

/// Render a `struct ifla_bridge_id` as `pppp.aabbccddeeff`.
pub(crate) fn format_bridge_id(data: &[u8]) -> Option<String> {
    if data.len() < 8 {
        return None;
    }
    let hex: String = data[..8].iter().map(|b| format!("{b:02x}")).collect();
    Some(format!("{}.{}", &hex[..4], &hex[4..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bridge_id() {
        let id = [0x80, 0x00, 0x52, 0x54, 0x00, 0x12, 0x34, 0x56];
        assert_eq!(format_bridge_id(&id).as_deref(), Some("8000.525400123456"));
        assert!(format_bridge_id(&id[..6]).is_none());
    }

    #[test]
    fn test_vlan_entry_json() {
        let entry = BridgeVlanEntry {
            vid: None,
            vid_range: Some((10, 20)),
            is_pvid: false,
            is_egress_untagged: true,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"vid_range": [10, 20], "is_pvid": false, "is_egress_untagged": true})
        );
    }

    #[test]
    fn test_vlan_protocol_names() {
        assert_eq!(
            serde_json::to_string(&BridgeVlanProtocol::from(0x88a8)).unwrap(),
            r#""802.1ad""#
        );
    }
}
