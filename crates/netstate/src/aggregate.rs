//! Snapshot assembly.
//!
//! Pure: everything here operates on data the collectors already returned.
//! Interfaces must have been classified and resolved before aggregation.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::collect::address::IfaceAddresses;
use crate::collect::route::{iface_name, to_route};
use crate::error::{Result, SnapshotError};
use crate::netlink::messages::RouteMessage;
use crate::state::{
    DnsResolver, EthtoolInfo, Iface, Ipv4Info, Mptcp, NetworkStateSnapshot, RouteRule, SriovInfo,
    SriovVfInfo, Warning,
};

/// Everything the aggregator assembles a snapshot from.
#[derive(Debug, Clone, Default)]
pub struct SnapshotParts {
    /// Classified and resolved interfaces.
    pub ifaces: BTreeMap<String, Iface>,
    /// Addresses by ifindex.
    pub addresses: HashMap<u32, IfaceAddresses>,
    /// Raw routes in collection order.
    pub routes: Vec<RouteMessage>,
    /// Rules in collection order.
    pub rules: Vec<RouteRule>,
    pub dns: Option<DnsResolver>,
    /// Endpoint `iface` values are still ifindex strings.
    pub mptcp: Option<Mptcp>,
    /// VFs by PF ifindex.
    pub sriov: HashMap<u32, SriovInfo>,
    /// Ethtool settings by interface name.
    pub ethtool: HashMap<String, EthtoolInfo>,
    pub warnings: Vec<Warning>,
}

/// Assemble the snapshot and check its invariants.
pub fn aggregate(parts: SnapshotParts) -> Result<NetworkStateSnapshot> {
    let SnapshotParts {
        mut ifaces,
        mut addresses,
        routes,
        rules,
        dns,
        mut mptcp,
        sriov,
        mut ethtool,
        warnings,
    } = parts;

    let names: HashMap<u32, String> = ifaces
        .values()
        .map(|iface| (iface.index, iface.name.clone()))
        .collect();

    for iface in ifaces.values_mut() {
        attach_addresses(iface, addresses.remove(&iface.index).unwrap_or_default());
        iface.ethtool = ethtool.remove(&iface.name);
    }

    if let Some(addrs) = mptcp.as_mut().and_then(|m| m.addresses.as_mut()) {
        for addr in addrs.iter_mut() {
            let Some(index) = addr.iface.as_deref().and_then(|i| i.parse::<u32>().ok()) else {
                continue;
            };
            let name = iface_name(&names, index);
            addr.iface = Some(name.clone());
            if let Some(iface) = ifaces.get_mut(&name) {
                iface.mptcp.get_or_insert_with(Vec::new).push(addr.clone());
            }
        }
    }

    attach_sriov(&mut ifaces, &names, sriov);

    let routes = routes.iter().map(|msg| to_route(msg, &names)).collect();

    for iface in ifaces.values() {
        iface
            .check_consistency()
            .map_err(SnapshotError::InternalInconsistency)?;
    }

    debug!(ifaces = ifaces.len(), warnings = warnings.len(), "snapshot assembled");
    Ok(NetworkStateSnapshot {
        ifaces,
        routes,
        rules,
        dns_resolver: dns,
        mptcp,
        warnings,
    })
}

/// Empty families are left absent; an IPv6 block survives without
/// addresses only when it carries a token.
fn attach_addresses(iface: &mut Iface, addrs: IfaceAddresses) {
    if !addrs.ipv4.is_empty() {
        iface.ipv4 = Some(Ipv4Info {
            addresses: addrs.ipv4,
        });
    }
    let mut ipv6 = iface.ipv6.take().unwrap_or_default();
    ipv6.addresses = addrs.ipv6;
    if !ipv6.addresses.is_empty() || ipv6.token.is_some() {
        iface.ipv6 = Some(ipv6);
    }
}

fn attach_sriov(
    ifaces: &mut BTreeMap<String, Iface>,
    names: &HashMap<u32, String>,
    sriov: HashMap<u32, SriovInfo>,
) {
    for (pf_index, info) in sriov {
        let Some(pf_name) = names.get(&pf_index) else {
            continue;
        };
        for vf in &info.vfs {
            let Some(vf_iface) = vf.iface_name.as_ref().and_then(|n| ifaces.get_mut(n)) else {
                continue;
            };
            vf_iface.sriov_vf = Some(SriovVfInfo {
                pf_name: pf_name.clone(),
                vf_id: vf.id,
            });
        }
        if let Some(pf) = ifaces.get_mut(pf_name) {
            pf.sriov = Some(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::netlink::types::family::AF_INET;
    use crate::state::{
        BondSubordinateInfo, ControllerType, Ipv4AddrInfo, Ipv6AddrInfo, Ipv6Info, MptcpAddress,
        VfInfo,
    };

    fn iface(index: u32, name: &str) -> Iface {
        Iface {
            name: name.to_string(),
            index,
            ..Default::default()
        }
    }

    fn parts(ifaces: &[Iface]) -> SnapshotParts {
        SnapshotParts {
            ifaces: ifaces
                .iter()
                .map(|i| (i.name.clone(), i.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_addresses_attached_and_ipv6_pruned() {
        let mut eth0 = iface(2, "eth0");
        eth0.ipv6 = Some(Ipv6Info::default());
        let mut eth1 = iface(3, "eth1");
        eth1.ipv6 = Some(Ipv6Info {
            token: Some("::1:2".parse().unwrap()),
            ..Default::default()
        });
        let mut p = parts(&[eth0, eth1]);
        p.addresses.insert(
            2,
            IfaceAddresses {
                ipv4: vec![Ipv4AddrInfo {
                    address: Ipv4Addr::new(192, 0, 2, 10),
                    prefix_len: 24,
                    peer: None,
                    valid_lft: "forever".into(),
                    preferred_lft: "forever".into(),
                }],
                ipv6: Vec::new(),
            },
        );

        let snap = aggregate(p).unwrap();
        let eth0 = &snap.ifaces["eth0"];
        assert_eq!(eth0.ipv4.as_ref().unwrap().addresses.len(), 1);
        assert!(eth0.ipv6.is_none());
        let eth1 = &snap.ifaces["eth1"];
        assert!(eth1.ipv4.is_none());
        assert!(eth1.ipv6.as_ref().unwrap().token.is_some());
    }

    #[test]
    fn test_ipv6_addresses_kept() {
        let mut p = parts(&[iface(1, "lo")]);
        p.addresses.insert(
            1,
            IfaceAddresses {
                ipv4: Vec::new(),
                ipv6: vec![Ipv6AddrInfo {
                    address: Ipv6Addr::LOCALHOST,
                    prefix_len: 128,
                    valid_lft: "forever".into(),
                    preferred_lft: "forever".into(),
                    flags: Vec::new(),
                    peer: None,
                }],
            },
        );
        let snap = aggregate(p).unwrap();
        assert_eq!(snap.ifaces["lo"].ipv6.as_ref().unwrap().addresses.len(), 1);
    }

    #[test]
    fn test_mptcp_endpoints_by_name() {
        let mut p = parts(&[iface(2, "eth0"), iface(3, "eth1")]);
        p.mptcp = Some(Mptcp {
            enabled: true,
            addresses: Some(vec![
                MptcpAddress {
                    address: "192.0.2.10".parse().unwrap(),
                    id: Some(1),
                    port: None,
                    flags: None,
                    iface: Some("2".into()),
                },
                MptcpAddress {
                    address: "198.51.100.10".parse().unwrap(),
                    id: Some(2),
                    port: None,
                    flags: None,
                    iface: None,
                },
            ]),
            ..Default::default()
        });

        let snap = aggregate(p).unwrap();
        let eth0 = snap.ifaces["eth0"].mptcp.as_ref().unwrap();
        assert_eq!(eth0.len(), 1);
        assert_eq!(eth0[0].iface.as_deref(), Some("eth0"));
        assert!(snap.ifaces["eth1"].mptcp.is_none());
        let all = snap.mptcp.unwrap().addresses.unwrap();
        assert_eq!(all[0].iface.as_deref(), Some("eth0"));
        assert!(all[1].iface.is_none());
    }

    #[test]
    fn test_sriov_pf_and_vf() {
        let mut p = parts(&[iface(4, "enp1s0f0"), iface(9, "enp1s0f0v0")]);
        p.sriov.insert(
            4,
            SriovInfo {
                vfs: vec![
                    VfInfo {
                        id: 0,
                        iface_name: Some("enp1s0f0v0".into()),
                        ..Default::default()
                    },
                    VfInfo {
                        id: 1,
                        ..Default::default()
                    },
                ],
            },
        );
        let snap = aggregate(p).unwrap();
        assert_eq!(snap.ifaces["enp1s0f0"].sriov.as_ref().unwrap().vfs.len(), 2);
        assert_eq!(
            snap.ifaces["enp1s0f0v0"].sriov_vf,
            Some(SriovVfInfo {
                pf_name: "enp1s0f0".into(),
                vf_id: 0
            })
        );
    }

    #[test]
    fn test_routes_resolve_names_in_order() {
        let mut p = parts(&[iface(2, "eth0")]);
        for (oif, metric) in [(2, 100), (7, 200)] {
            let mut msg = RouteMessage::default();
            msg.header.rtm_family = AF_INET;
            msg.oif = Some(oif);
            msg.priority = Some(metric);
            p.routes.push(msg);
        }
        let snap = aggregate(p).unwrap();
        let oifs: Vec<_> = snap.routes.iter().map(|r| r.oif.clone().unwrap()).collect();
        assert_eq!(oifs, vec!["eth0", "7"]);
    }

    #[test]
    fn test_ethtool_by_name() {
        let mut p = parts(&[iface(2, "eth0")]);
        p.ethtool.insert(
            "eth0".into(),
            EthtoolInfo {
                pause: Some(Default::default()),
                ..Default::default()
            },
        );
        p.ethtool.insert("gone0".into(), EthtoolInfo::default());
        let snap = aggregate(p).unwrap();
        assert!(snap.ifaces["eth0"].ethtool.as_ref().unwrap().pause.is_some());
    }

    #[test]
    fn test_inconsistency_aborts() {
        let mut eth0 = iface(2, "eth0");
        eth0.bond_subordinate = Some(BondSubordinateInfo::default());
        assert!(matches!(
            aggregate(parts(&[eth0.clone()])),
            Err(SnapshotError::InternalInconsistency(_))
        ));

        eth0.controller_type = Some(ControllerType::Bond);
        assert!(aggregate(parts(&[eth0])).is_ok());
    }
}
