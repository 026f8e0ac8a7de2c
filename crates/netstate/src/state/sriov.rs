use serde::{Deserialize, Serialize};

/// SR-IOV virtual functions of a physical function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SriovInfo {
    pub vfs: Vec<VfInfo>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VfLinkState {
    #[default]
    Auto,
    Enable,
    Disable,
    Other(u32),
}

impl From<u32> for VfLinkState {
    fn from(v: u32) -> Self {
        match v {
            0 => Self::Auto,
            1 => Self::Enable,
            2 => Self::Disable,
            v => Self::Other(v),
        }
    }
}

/// Per-VF traffic counters (IFLA_VF_STATS).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfState {
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub broadcast: u64,
    pub multicast: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfInfo {
    pub id: u32,
    /// Netdev name of the VF, when its driver is bound.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iface_name: Option<String>,
    pub mac: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub broadcast: Option<String>,
    pub vlan_id: u32,
    pub qos: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vlan_proto: Option<u16>,
    pub tx_rate: u32,
    pub min_tx_rate: u32,
    pub max_tx_rate: u32,
    pub spoof_check: bool,
    pub trust: bool,
    pub link_state: VfLinkState,
    pub query_rss: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ib_node_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ib_port_guid: Option<String>,
    pub state: VfState,
}

/// Back-reference set on a VF netdev.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SriovVfInfo {
    pub pf_name: String,
    pub vf_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state() {
        assert_eq!(VfLinkState::from(2), VfLinkState::Disable);
        assert_eq!(
            serde_json::to_string(&VfLinkState::Auto).unwrap(),
            r#""auto""#
        );
    }

    #[test]
    fn test_vf_optional_fields_omitted() {
        let vf = VfInfo {
            id: 0,
            mac: "00:11:22:33:44:55".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&vf).unwrap();
        assert!(json.get("iface_name").is_none());
        assert!(json.get("ib_node_guid").is_none());
        assert_eq!(json["state"]["rx_packets"], 0);
    }
}
