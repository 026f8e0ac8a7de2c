use serde::{Deserialize, Serialize};

use super::{
    BondInfo, BondSubordinateInfo, BridgeInfo, BridgePortInfo, BridgeVlanEntry, EthtoolInfo,
    HsrInfo, IpoibInfo, Ipv4Info, Ipv6Info, MacSecInfo, MacVlanInfo, MptcpAddress, SriovInfo,
    SriovVfInfo, TunInfo, VethInfo, VlanInfo, VrfInfo, VrfSubordinateInfo, VxlanInfo,
};
use crate::netlink::types::link::iff;

/// Closed set of interface types.
///
/// Kinds outside this set are reported as `Plain`; the raw kind string is
/// still kept in [`Iface::kind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceType {
    #[default]
    Plain,
    Bond,
    Bridge,
    Vlan,
    Vxlan,
    Veth,
    Tun,
    Vrf,
    MacVlan,
    MacVtap,
    MacSec,
    Ipoib,
    Hsr,
}

/// Kind of the controller an interface is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerType {
    Bond,
    Bridge,
    Vrf,
    #[serde(rename = "openvswitch")]
    OpenvSwitch,
    /// Any other controller kind, named by its IFLA_INFO_KIND.
    Other(String),
}

impl ControllerType {
    /// Controller type of an interface acting as a controller. `kind` is
    /// consulted only when the interface type carries no controller role.
    pub fn for_controller(iface_type: InterfaceType, kind: Option<&str>) -> Self {
        match iface_type {
            InterfaceType::Bond => Self::Bond,
            InterfaceType::Bridge => Self::Bridge,
            InterfaceType::Vrf => Self::Vrf,
            _ => Self::from(kind.unwrap_or_default()),
        }
    }

    /// Whether a subordinate record exists for this controller type.
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Bond | Self::Bridge | Self::Vrf)
    }
}

impl From<&str> for ControllerType {
    fn from(kind: &str) -> Self {
        match kind {
            "bond" => Self::Bond,
            "bridge" => Self::Bridge,
            "vrf" => Self::Vrf,
            "openvswitch" => Self::OpenvSwitch,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Operational state (IFLA_OPERSTATE).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfaceState {
    Up,
    Dormant,
    Down,
    LowerLayerDown,
    Testing,
    NotPresent,
    #[default]
    Unknown,
}

impl From<u8> for IfaceState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::NotPresent,
            2 => Self::Down,
            3 => Self::LowerLayerDown,
            4 => Self::Testing,
            5 => Self::Dormant,
            6 => Self::Up,
            _ => Self::Unknown,
        }
    }
}

/// Device flags (IFF_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfaceFlag {
    Up,
    Broadcast,
    Debug,
    Loopback,
    PointToPoint,
    NoTrailers,
    Running,
    NoArp,
    Promisc,
    AllMulti,
    Controller,
    Subordinate,
    Multicast,
    PortSel,
    AutoMedia,
    Dynamic,
    LowerUp,
    Dormant,
    Echo,
}

const IFF_NAMES: &[(u32, IfaceFlag)] = &[
    (iff::UP, IfaceFlag::Up),
    (iff::BROADCAST, IfaceFlag::Broadcast),
    (iff::DEBUG, IfaceFlag::Debug),
    (iff::LOOPBACK, IfaceFlag::Loopback),
    (iff::POINTOPOINT, IfaceFlag::PointToPoint),
    (iff::NOTRAILERS, IfaceFlag::NoTrailers),
    (iff::RUNNING, IfaceFlag::Running),
    (iff::NOARP, IfaceFlag::NoArp),
    (iff::PROMISC, IfaceFlag::Promisc),
    (iff::ALLMULTI, IfaceFlag::AllMulti),
    (iff::MASTER, IfaceFlag::Controller),
    (iff::SLAVE, IfaceFlag::Subordinate),
    (iff::MULTICAST, IfaceFlag::Multicast),
    (iff::PORTSEL, IfaceFlag::PortSel),
    (iff::AUTOMEDIA, IfaceFlag::AutoMedia),
    (iff::DYNAMIC, IfaceFlag::Dynamic),
    (iff::LOWER_UP, IfaceFlag::LowerUp),
    (iff::DORMANT, IfaceFlag::Dormant),
    (iff::ECHO, IfaceFlag::Echo),
];

impl IfaceFlag {
    /// Expand an IFF_* bitmask, lowest bit first.
    pub fn from_bits(bits: u32) -> Vec<Self> {
        IFF_NAMES
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, flag)| *flag)
            .collect()
    }
}

/// Type-specific data for one interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Bond(BondInfo),
    Bridge(BridgeInfo),
    Vlan(VlanInfo),
    Vxlan(VxlanInfo),
    Veth(VethInfo),
    Tun(TunInfo),
    Vrf(VrfInfo),
    MacVlan(MacVlanInfo),
    MacVtap(MacVlanInfo),
    MacSec(MacSecInfo),
    Ipoib(IpoibInfo),
    Hsr(HsrInfo),
}

impl Extension {
    /// The interface type this extension belongs to.
    pub fn iface_type(&self) -> InterfaceType {
        match self {
            Self::Bond(_) => InterfaceType::Bond,
            Self::Bridge(_) => InterfaceType::Bridge,
            Self::Vlan(_) => InterfaceType::Vlan,
            Self::Vxlan(_) => InterfaceType::Vxlan,
            Self::Veth(_) => InterfaceType::Veth,
            Self::Tun(_) => InterfaceType::Tun,
            Self::Vrf(_) => InterfaceType::Vrf,
            Self::MacVlan(_) => InterfaceType::MacVlan,
            Self::MacVtap(_) => InterfaceType::MacVtap,
            Self::MacSec(_) => InterfaceType::MacSec,
            Self::Ipoib(_) => InterfaceType::Ipoib,
            Self::Hsr(_) => InterfaceType::Hsr,
        }
    }
}

/// One kernel network device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Iface {
    pub name: String,
    pub index: u32,
    pub iface_type: InterfaceType,
    /// Raw IFLA_INFO_KIND, kept even when the type is `plain`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    pub state: IfaceState,
    pub mtu: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min_mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_mtu: Option<u32>,
    #[serde(default)]
    pub flags: Vec<IfaceFlag>,
    #[serde(default)]
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub permanent_mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipv4: Option<Ipv4Info>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipv6: Option<Ipv6Info>,
    /// Controller name, or its index when the controller is not in the
    /// snapshot.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub controller_type: Option<ControllerType>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub link_netnsid: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bond: Option<BondInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bridge: Option<BridgeInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vlan: Option<VlanInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vxlan: Option<VxlanInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub veth: Option<VethInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tun: Option<TunInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vrf: Option<VrfInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mac_vlan: Option<MacVlanInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mac_vtap: Option<MacVlanInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub macsec: Option<MacSecInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipoib: Option<IpoibInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hsr: Option<HsrInfo>,
    /// VLANs configured on the bridge device itself.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bridge_vlan: Option<Vec<BridgeVlanEntry>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bond_subordinate: Option<BondSubordinateInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bridge_port: Option<BridgePortInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vrf_subordinate: Option<VrfSubordinateInfo>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sriov: Option<SriovInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sriov_vf: Option<SriovVfInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ethtool: Option<EthtoolInfo>,
    /// MPTCP endpoints bound to this interface.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mptcp: Option<Vec<MptcpAddress>>,
}

impl Iface {
    /// Store `ext` in the field matching its type.
    pub fn set_extension(&mut self, ext: Extension) {
        match ext {
            Extension::Bond(v) => self.bond = Some(v),
            Extension::Bridge(v) => self.bridge = Some(v),
            Extension::Vlan(v) => self.vlan = Some(v),
            Extension::Vxlan(v) => self.vxlan = Some(v),
            Extension::Veth(v) => self.veth = Some(v),
            Extension::Tun(v) => self.tun = Some(v),
            Extension::Vrf(v) => self.vrf = Some(v),
            Extension::MacVlan(v) => self.mac_vlan = Some(v),
            Extension::MacVtap(v) => self.mac_vtap = Some(v),
            Extension::MacSec(v) => self.macsec = Some(v),
            Extension::Ipoib(v) => self.ipoib = Some(v),
            Extension::Hsr(v) => self.hsr = Some(v),
        }
    }

    /// Types of every populated extension field.
    pub fn extension_types(&self) -> Vec<InterfaceType> {
        let present = [
            (self.bond.is_some(), InterfaceType::Bond),
            (self.bridge.is_some(), InterfaceType::Bridge),
            (self.vlan.is_some(), InterfaceType::Vlan),
            (self.vxlan.is_some(), InterfaceType::Vxlan),
            (self.veth.is_some(), InterfaceType::Veth),
            (self.tun.is_some(), InterfaceType::Tun),
            (self.vrf.is_some(), InterfaceType::Vrf),
            (self.mac_vlan.is_some(), InterfaceType::MacVlan),
            (self.mac_vtap.is_some(), InterfaceType::MacVtap),
            (self.macsec.is_some(), InterfaceType::MacSec),
            (self.ipoib.is_some(), InterfaceType::Ipoib),
            (self.hsr.is_some(), InterfaceType::Hsr),
        ];
        present
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, t)| t)
            .collect()
    }

    /// Controller types of every populated subordinate field.
    pub fn subordinate_types(&self) -> Vec<ControllerType> {
        let present = [
            (self.bond_subordinate.is_some(), ControllerType::Bond),
            (self.bridge_port.is_some(), ControllerType::Bridge),
            (self.vrf_subordinate.is_some(), ControllerType::Vrf),
        ];
        present
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, t)| t)
            .collect()
    }

    /// Check the type/extension and controller/subordinate invariants.
    ///
    /// Returns a description of the first violation.
    pub fn check_consistency(&self) -> Result<(), String> {
        let ext = self.extension_types();
        match ext.as_slice() {
            [] => {}
            [t] if *t == self.iface_type => {}
            _ => {
                return Err(format!(
                    "interface {} of type {:?} carries extensions {:?}",
                    self.name, self.iface_type, ext
                ));
            }
        }

        let sub = self.subordinate_types();
        let expected: Vec<ControllerType> = self
            .controller_type
            .iter()
            .filter(|t| t.is_recognized())
            .cloned()
            .collect();
        if sub != expected {
            return Err(format!(
                "interface {} with controller type {:?} carries subordinate state {:?}",
                self.name, self.controller_type, sub
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iface_flags_from_bits() {
        let flags = IfaceFlag::from_bits(iff::UP | iff::LOOPBACK | iff::RUNNING | iff::LOWER_UP);
        assert_eq!(
            flags,
            vec![
                IfaceFlag::Up,
                IfaceFlag::Loopback,
                IfaceFlag::Running,
                IfaceFlag::LowerUp
            ]
        );
    }

    #[test]
    fn test_operstate_mapping() {
        assert_eq!(IfaceState::from(6), IfaceState::Up);
        assert_eq!(IfaceState::from(2), IfaceState::Down);
        assert_eq!(IfaceState::from(3), IfaceState::LowerLayerDown);
        assert_eq!(IfaceState::from(42), IfaceState::Unknown);
    }

    #[test]
    fn test_consistency_extension_mismatch() {
        let mut iface = Iface {
            name: "vlan10".into(),
            iface_type: InterfaceType::Bond,
            ..Default::default()
        };
        iface.set_extension(Extension::Vlan(VlanInfo::default()));
        assert!(iface.check_consistency().is_err());

        iface.iface_type = InterfaceType::Vlan;
        assert!(iface.check_consistency().is_ok());
    }

    #[test]
    fn test_consistency_subordinate_without_controller() {
        let mut iface = Iface {
            name: "eth0".into(),
            bond_subordinate: Some(BondSubordinateInfo::default()),
            ..Default::default()
        };
        assert!(iface.check_consistency().is_err());

        iface.controller_type = Some(ControllerType::Bond);
        assert!(iface.check_consistency().is_ok());

        iface.controller_type = Some(ControllerType::Other("team".into()));
        assert!(iface.check_consistency().is_err());
    }

    #[test]
    fn test_controller_type_from_kind() {
        assert_eq!(ControllerType::from("bond"), ControllerType::Bond);
        assert_eq!(ControllerType::from("openvswitch"), ControllerType::OpenvSwitch);
        assert_eq!(
            ControllerType::from("team"),
            ControllerType::Other("team".into())
        );
        assert!(!ControllerType::OpenvSwitch.is_recognized());
        assert_eq!(
            ControllerType::for_controller(InterfaceType::Plain, Some("team")),
            ControllerType::Other("team".into())
        );
        assert_eq!(
            ControllerType::for_controller(InterfaceType::Bridge, Some("bridge")),
            ControllerType::Bridge
        );
        assert_eq!(
            serde_json::to_string(&ControllerType::OpenvSwitch).unwrap(),
            r#""openvswitch""#
        );
        assert_eq!(
            serde_json::to_string(&ControllerType::Other("team".into())).unwrap(),
            r#"{"other":"team"}"#
        );
    }

    #[test]
    fn test_type_serialization() {
        assert_eq!(
            serde_json::to_string(&InterfaceType::MacVtap).unwrap(),
            r#""mac_vtap""#
        );
        assert_eq!(
            serde_json::to_string(&ControllerType::Bond).unwrap(),
            r#""bond""#
        );
        assert_eq!(
            serde_json::to_string(&IfaceState::LowerLayerDown).unwrap(),
            r#""lower_layer_down""#
        );
    }
}
