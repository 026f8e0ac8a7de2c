//! Relationship resolution.
//!
//! Runs once every link is classified: attaches controllers and their
//! subordinate records, rewrites index references to names and fills the
//! member lists of bonds, bridges and VRFs.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::classify::{bond, bridge, vrf};
use crate::netlink::messages::LinkMessage;
use crate::state::{BridgeVlanEntry, ControllerType, Iface};

/// Controller membership of one link, as reported by the link dump.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// Name of the subordinate interface.
    pub name: String,
    pub index: u32,
    /// IFLA_MASTER.
    pub master: u32,
    /// IFLA_INFO_SLAVE_KIND.
    pub subordinate_kind: Option<String>,
    /// IFLA_INFO_SLAVE_DATA, raw.
    pub subordinate_data: Option<Vec<u8>>,
}

impl Membership {
    /// Membership of `link`, if it has a controller.
    pub fn from_link(link: &LinkMessage) -> Option<Self> {
        let master = link.master.filter(|idx| *idx != 0)?;
        Some(Self {
            name: link.name_or_empty().to_string(),
            index: link.ifindex(),
            master,
            subordinate_kind: link.subordinate_kind.clone(),
            subordinate_data: link.subordinate_data.clone(),
        })
    }
}

/// Resolve controller relationships and index references in place.
///
/// `bridge_vlans` maps ifindex to the VLAN entries of the AF_BRIDGE dump.
pub fn resolve(
    ifaces: &mut BTreeMap<String, Iface>,
    memberships: &[Membership],
    bridge_vlans: &HashMap<u32, Vec<BridgeVlanEntry>>,
) {
    let names: HashMap<u32, String> = ifaces
        .values()
        .map(|iface| (iface.index, iface.name.clone()))
        .collect();
    let types: HashMap<u32, ControllerType> = ifaces
        .values()
        .map(|iface| {
            let controller_type =
                ControllerType::for_controller(iface.iface_type, iface.kind.as_deref());
            (iface.index, controller_type)
        })
        .collect();

    for m in memberships {
        let Some(iface) = ifaces.get_mut(&m.name) else {
            continue;
        };
        attach_controller(iface, m, &names, &types);
    }

    for iface in ifaces.values_mut() {
        rename_references(iface, &names);
    }

    fill_members(ifaces);

    for (index, entries) in bridge_vlans {
        let Some(iface) = names.get(index).and_then(|name| ifaces.get_mut(name)) else {
            continue;
        };
        if iface.bridge.is_some() {
            iface.bridge_vlan = Some(entries.clone());
        } else if let Some(port) = iface.bridge_port.as_mut() {
            port.vlans = Some(entries.clone());
        }
    }
}

fn attach_controller(
    iface: &mut Iface,
    m: &Membership,
    names: &HashMap<u32, String>,
    types: &HashMap<u32, ControllerType>,
) {
    let (Some(controller), Some(controller_type)) = (names.get(&m.master), types.get(&m.master))
    else {
        debug!(iface = %m.name, master = m.master, "controller not in dump");
        iface.controller = Some(m.master.to_string());
        return;
    };

    // A controller without IFLA_INFO_KIND is named by the port's slave kind.
    let controller_type = match (controller_type, m.subordinate_kind.as_deref()) {
        (ControllerType::Other(kind), Some(subordinate_kind)) if kind.is_empty() => {
            ControllerType::from(subordinate_kind)
        }
        (controller_type, _) => controller_type.clone(),
    };

    iface.controller = Some(controller.clone());

    let data = m.subordinate_data.as_deref().unwrap_or(&[]);
    match controller_type {
        ControllerType::Bond => iface.bond_subordinate = Some(bond::decode_subordinate(data)),
        ControllerType::Bridge => iface.bridge_port = Some(bridge::decode_port(data)),
        ControllerType::Vrf => iface.vrf_subordinate = Some(vrf::decode_subordinate(data)),
        ControllerType::OpenvSwitch | ControllerType::Other(_) => {}
    }
    iface.controller_type = Some(controller_type);
}

/// Replace an ifindex string with the interface name, when known.
fn rename(reference: &mut String, names: &HashMap<u32, String>) {
    if let Some(name) = reference.parse::<u32>().ok().and_then(|idx| names.get(&idx)) {
        *reference = name.clone();
    }
}

fn rename_opt(reference: &mut Option<String>, names: &HashMap<u32, String>) {
    if let Some(r) = reference.as_mut() {
        rename(r, names);
    }
}

fn rename_references(iface: &mut Iface, names: &HashMap<u32, String>) {
    if let Some(bond) = iface.bond.as_mut() {
        rename_opt(&mut bond.primary, names);
    }
    if let Some(port) = iface.bridge_port.as_mut() {
        rename_opt(&mut port.backup_port, names);
    }
    if let Some(vxlan) = iface.vxlan.as_mut() {
        rename_opt(&mut vxlan.base_iface, names);
    }
    if let Some(hsr) = iface.hsr.as_mut() {
        rename_opt(&mut hsr.port1, names);
        rename_opt(&mut hsr.port2, names);
    }

    // IFLA_LINK indexes belong to the peer namespace when a netnsid is set.
    if iface.link_netnsid.is_some() {
        return;
    }
    if let Some(vlan) = iface.vlan.as_mut() {
        rename(&mut vlan.base_iface, names);
    }
    if let Some(veth) = iface.veth.as_mut() {
        rename(&mut veth.peer, names);
    }
    if let Some(mac_vlan) = iface.mac_vlan.as_mut() {
        rename(&mut mac_vlan.base_iface, names);
    }
    if let Some(mac_vtap) = iface.mac_vtap.as_mut() {
        rename(&mut mac_vtap.base_iface, names);
    }
    if let Some(macsec) = iface.macsec.as_mut() {
        rename_opt(&mut macsec.base_iface, names);
    }
    if let Some(ipoib) = iface.ipoib.as_mut() {
        rename_opt(&mut ipoib.base_iface, names);
    }
}

fn fill_members(ifaces: &mut BTreeMap<String, Iface>) {
    // Map iteration yields member names in sorted order.
    let members: Vec<(String, ControllerType, String)> = ifaces
        .values()
        .filter_map(|iface| {
            let controller = iface.controller.clone()?;
            let controller_type = iface.controller_type.clone()?;
            Some((controller, controller_type, iface.name.clone()))
        })
        .collect();

    for (controller, controller_type, member) in members {
        let Some(ctrl) = ifaces.get_mut(&controller) else {
            continue;
        };
        match controller_type {
            ControllerType::Bond => {
                if let Some(bond) = ctrl.bond.as_mut() {
                    bond.subordinates.push(member);
                }
            }
            ControllerType::Bridge => {
                if let Some(bridge) = ctrl.bridge.as_mut() {
                    bridge.ports.push(member);
                }
            }
            ControllerType::Vrf => {
                if let Some(vrf) = ctrl.vrf.as_mut() {
                    vrf.subordinates.push(member);
                }
            }
            ControllerType::OpenvSwitch | ControllerType::Other(_) => {}
        }
    }
}
