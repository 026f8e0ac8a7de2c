//! Records for stacked and virtual interface kinds.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VlanProtocol {
    #[default]
    #[serde(rename = "802.1q")]
    Ieee8021Q,
    #[serde(rename = "802.1ad")]
    Ieee8021Ad,
    #[serde(rename = "other")]
    Other(u16),
}

impl From<u16> for VlanProtocol {
    fn from(v: u16) -> Self {
        match v {
            0x8100 => Self::Ieee8021Q,
            0x88a8 => Self::Ieee8021Ad,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanInfo {
    pub vlan_id: u16,
    pub protocol: VlanProtocol,
    pub base_iface: String,
    pub is_reorder_hdr: bool,
    pub is_gvrp: bool,
    pub is_loose_binding: bool,
    pub is_mvrp: bool,
    pub is_bridge_binding: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VxlanInfo {
    pub vxlan_id: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_iface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub remote: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub local: Option<IpAddr>,
    pub ttl: u8,
    pub tos: u8,
    pub label: u32,
    pub df: u8,
    pub ttl_inherit: bool,
    pub learning: bool,
    pub ageing: u32,
    pub max_address: u32,
    pub src_port_min: u16,
    pub src_port_max: u16,
    pub dst_port: u16,
    pub proxy: bool,
    pub rsc: bool,
    pub l2miss: bool,
    pub l3miss: bool,
    pub udp_check_sum: bool,
    pub udp6_zero_check_sum_tx: bool,
    pub udp6_zero_check_sum_rx: bool,
    pub remote_check_sum_tx: bool,
    pub remote_check_sum_rx: bool,
    pub remote_check_sum_no_partial: bool,
    pub gbp: bool,
    pub gpe: bool,
    pub collect_metadata: bool,
    /// Deprecated alias of `dst_port`.
    #[serde(default)]
    pub dst_port_min: u16,
    /// Deprecated alias of `dst_port`.
    #[serde(default)]
    pub dst_port_max: u16,
}

impl VxlanInfo {
    /// Destination UDP port, falling back to the deprecated aliases for
    /// records that only carry those.
    pub fn effective_dst_port(&self) -> u16 {
        if self.dst_port != 0 {
            self.dst_port
        } else if self.dst_port_min != 0 {
            self.dst_port_min
        } else {
            self.dst_port_max
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VethInfo {
    /// Peer name, or its index when the peer lives in another namespace.
    pub peer: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunMode {
    #[default]
    Tun,
    Tap,
    Other(u8),
}

impl From<u8> for TunMode {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Tun,
            2 => Self::Tap,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunInfo {
    pub mode: TunMode,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<u32>,
    pub pi: bool,
    pub vnet_hdr: bool,
    pub multi_queue: bool,
    pub persist: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_queues: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub num_disabled_queues: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfInfo {
    pub table_id: u32,
    #[serde(default)]
    pub subordinates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfSubordinateInfo {
    pub table_id: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacVlanMode {
    Private,
    Vepa,
    #[default]
    Bridge,
    Passthru,
    Source,
    Other(u32),
}

impl From<u32> for MacVlanMode {
    fn from(v: u32) -> Self {
        match v {
            1 => Self::Private,
            2 => Self::Vepa,
            4 => Self::Bridge,
            8 => Self::Passthru,
            16 => Self::Source,
            v => Self::Other(v),
        }
    }
}

/// Shared by macvlan and macvtap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacVlanInfo {
    pub base_iface: String,
    pub mode: MacVlanMode,
    pub flags: u16,
    /// Source-mode allow list.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub allowed_mac_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacSecValidate {
    Disabled,
    Check,
    #[default]
    Strict,
    Other(u8),
}

impl From<u8> for MacSecValidate {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Disabled,
            1 => Self::Check,
            2 => Self::Strict,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacSecOffload {
    #[default]
    Off,
    Phy,
    Mac,
    Other(u8),
}

impl From<u8> for MacSecOffload {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Off,
            1 => Self::Phy,
            2 => Self::Mac,
            v => Self::Other(v),
        }
    }
}

const MACSEC_DEFAULT_CIPHER_ID: u64 = 0x0080_0200_0100_0001;
const MACSEC_CIPHER_ID_GCM_AES_128: u64 = 0x0080_C200_0100_0001;
const MACSEC_CIPHER_ID_GCM_AES_256: u64 = 0x0080_C200_0100_0002;
const MACSEC_CIPHER_ID_GCM_AES_XPN_128: u64 = 0x0080_C200_0100_0003;
const MACSEC_CIPHER_ID_GCM_AES_XPN_256: u64 = 0x0080_C200_0100_0004;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MacSecCipherId {
    #[default]
    GcmAes128,
    GcmAes256,
    GcmAesXpn128,
    GcmAesXpn256,
    Other(u64),
}

impl From<u64> for MacSecCipherId {
    fn from(v: u64) -> Self {
        match v {
            MACSEC_DEFAULT_CIPHER_ID | MACSEC_CIPHER_ID_GCM_AES_128 => Self::GcmAes128,
            MACSEC_CIPHER_ID_GCM_AES_256 => Self::GcmAes256,
            MACSEC_CIPHER_ID_GCM_AES_XPN_128 => Self::GcmAesXpn128,
            MACSEC_CIPHER_ID_GCM_AES_XPN_256 => Self::GcmAesXpn256,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacSecInfo {
    pub sci: u64,
    pub port: u16,
    pub icv_len: u8,
    pub cipher: MacSecCipherId,
    pub window: u32,
    pub encoding_sa: u8,
    pub encrypt: bool,
    pub protect: bool,
    pub send_sci: bool,
    pub end_station: bool,
    pub scb: bool,
    pub replay_protect: bool,
    pub validate: MacSecValidate,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offload: Option<MacSecOffload>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_iface: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpoibMode {
    #[default]
    Datagram,
    Connected,
    Other(u16),
}

impl From<u16> for IpoibMode {
    fn from(v: u16) -> Self {
        match v {
            0 => Self::Datagram,
            1 => Self::Connected,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpoibInfo {
    pub pkey: u16,
    pub mode: IpoibMode,
    pub umcast: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_iface: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HsrProtocol {
    #[default]
    Hsr,
    Prp,
    Other(u8),
}

impl From<u8> for HsrProtocol {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Hsr,
            1 => Self::Prp,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsrInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port2: Option<String>,
    pub supervision_addr: String,
    pub seq_nr: u16,
    pub multicast_spec: u8,
    pub version: u8,
    pub protocol: HsrProtocol,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vxlan_dst_port_aliases() {
        let info = VxlanInfo {
            vxlan_id: 101,
            dst_port: 4789,
            dst_port_min: 4789,
            dst_port_max: 4789,
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["dst_port"], 4789);
        assert_eq!(json["dst_port_min"], 4789);
        assert_eq!(json["dst_port_max"], 4789);

        let legacy: VxlanInfo = serde_json::from_value(serde_json::json!({
            "vxlan_id": 101, "ttl": 0, "tos": 0, "label": 0, "df": 0,
            "ttl_inherit": false, "learning": true, "ageing": 300,
            "max_address": 0, "src_port_min": 0, "src_port_max": 0,
            "dst_port": 0, "proxy": false, "rsc": false, "l2miss": false,
            "l3miss": false, "udp_check_sum": true,
            "udp6_zero_check_sum_tx": false, "udp6_zero_check_sum_rx": false,
            "remote_check_sum_tx": false, "remote_check_sum_rx": false,
            "remote_check_sum_no_partial": false, "gbp": false, "gpe": false,
            "collect_metadata": false, "dst_port_min": 8472
        }))
        .unwrap();
        assert_eq!(legacy.effective_dst_port(), 8472);
    }

    #[test]
    fn test_macsec_cipher_names() {
        assert_eq!(
            MacSecCipherId::from(MACSEC_DEFAULT_CIPHER_ID),
            MacSecCipherId::GcmAes128
        );
        assert_eq!(
            serde_json::to_string(&MacSecCipherId::from(MACSEC_CIPHER_ID_GCM_AES_XPN_256)).unwrap(),
            r#""gcm-aes-xpn256""#
        );
    }

    #[test]
    fn test_mode_mappings() {
        assert_eq!(MacVlanMode::from(8), MacVlanMode::Passthru);
        assert_eq!(TunMode::from(2), TunMode::Tap);
        assert_eq!(IpoibMode::from(1), IpoibMode::Connected);
        assert_eq!(HsrProtocol::from(1), HsrProtocol::Prp);
    }
}
