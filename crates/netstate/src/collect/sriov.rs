//! SR-IOV virtual functions.
//!
//! VF records come from IFLA_VFINFO_LIST of the link dump; the netdev name
//! of each VF comes from sysfs. Each `ifla_vf_*` struct starts with the
//! u32 VF number, followed by the value.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use tracing::debug;

use super::Collection;
use crate::netlink::attr::{AttrIter, AttrMap, get};
use crate::netlink::messages::LinkMessage;
use crate::state::{SriovInfo, VfInfo, VfLinkState, VfState, Warning, WarningSource};

pub(crate) mod ifla_vf {
    pub const INFO: u16 = 1;

    pub const MAC: u16 = 1;
    pub const VLAN: u16 = 2;
    pub const TX_RATE: u16 = 3;
    pub const SPOOFCHK: u16 = 4;
    pub const LINK_STATE: u16 = 5;
    pub const RATE: u16 = 6;
    pub const RSS_QUERY_EN: u16 = 7;
    pub const STATS: u16 = 8;
    pub const TRUST: u16 = 9;
    pub const IB_NODE_GUID: u16 = 10;
    pub const IB_PORT_GUID: u16 = 11;
    pub const VLAN_LIST: u16 = 12;
    pub const BROADCAST: u16 = 13;

    pub const VLAN_INFO: u16 = 1;
}

mod ifla_vf_stats {
    pub const RX_PACKETS: u16 = 0;
    pub const TX_PACKETS: u16 = 1;
    pub const RX_BYTES: u16 = 2;
    pub const TX_BYTES: u16 = 3;
    pub const BROADCAST: u16 = 4;
    pub const MULTICAST: u16 = 5;
    pub const RX_DROPPED: u16 = 7;
    pub const TX_DROPPED: u16 = 8;
}

/// Decode the VFs of every physical function and look up their netdevs.
///
/// Keyed by PF ifindex. A sysfs failure for one VF is a warning; the VF is
/// still reported, without a name.
pub async fn collect(
    links: &[LinkMessage],
    sysfs_root: &Path,
) -> Collection<HashMap<u32, SriovInfo>> {
    let mut pfs = HashMap::new();
    let mut warnings = Vec::new();

    for link in links {
        let Some(list) = link.vfinfo_list.as_deref() else {
            continue;
        };
        let mac_len = link.address.as_ref().map_or(6, Vec::len);
        let mut vfs = decode_vf_list(list, mac_len);
        if vfs.is_empty() {
            continue;
        }

        let pf = link.name_or_empty();
        for vf in &mut vfs {
            match vf_netdev(sysfs_root, pf, vf.id).await {
                Ok(name) => vf.iface_name = name,
                Err(e) => warnings.push(Warning::for_iface(
                    WarningSource::Sriov,
                    pf,
                    format!("VF {}: cannot read netdev name: {e}", vf.id),
                )),
            }
        }
        debug!(pf, vfs = vfs.len(), "SR-IOV VFs collected");
        pfs.insert(link.ifindex(), SriovInfo { vfs });
    }

    Collection::with_warnings(pfs, warnings)
}

/// Name of the netdev bound to VF `id`, if its driver created one.
async fn vf_netdev(sysfs_root: &Path, pf: &str, id: u32) -> io::Result<Option<String>> {
    let dir = sysfs_root
        .join("class/net")
        .join(pf)
        .join("device")
        .join(format!("virtfn{id}"))
        .join("net");
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names.into_iter().next())
}

/// The u32 following the VF number.
fn vf_value(data: &[u8]) -> Option<u32> {
    get::u32_ne(data.get(4..)?).ok()
}

fn vf_values<const N: usize>(data: &[u8]) -> Option<[u32; N]> {
    let mut out = [0u32; N];
    for (i, v) in out.iter_mut().enumerate() {
        *v = get::u32_ne(data.get(4 + i * 4..)?).ok()?;
    }
    Some(out)
}

/// `struct ifla_vf_guid { __u32 vf; __u64 guid; }`, 8-byte aligned.
fn vf_guid(data: &[u8]) -> Option<String> {
    let guid = get::u64_ne(data.get(8..)?).ok()?;
    Some(get::mac(&guid.to_be_bytes()))
}

pub(crate) fn decode_vf_list(list: &[u8], mac_len: usize) -> Vec<VfInfo> {
    AttrIter::new(list)
        .filter(|(kind, _)| *kind == ifla_vf::INFO)
        .filter_map(|(_, data)| decode_vf(data, mac_len))
        .collect()
}

fn decode_vf(data: &[u8], mac_len: usize) -> Option<VfInfo> {
    use ifla_vf as a;

    let attrs = AttrMap::new(data);
    let mac = attrs.get(a::MAC)?;
    let id = get::u32_ne(mac).ok()?;
    let hw = |d: &[u8], offset: usize| d.get(offset..offset + mac_len).map(get::mac);

    let [vlan_id, qos] = attrs.get(a::VLAN).and_then(vf_values::<2>).unwrap_or([0, 0]);
    let [min_tx_rate, max_tx_rate] = attrs.get(a::RATE).and_then(vf_values::<2>).unwrap_or([0, 0]);
    let setting = |kind| attrs.get(kind).and_then(vf_value);

    // struct ifla_vf_vlan_info { vf; vlan; qos; __be16 vlan_proto; }
    let vlan_proto = attrs.get(a::VLAN_LIST).and_then(|list| {
        let (_, info) = AttrIter::new(list).find(|(kind, _)| *kind == a::VLAN_INFO)?;
        get::u16_be(info.get(12..)?).ok()
    });

    Some(VfInfo {
        id,
        iface_name: None,
        mac: hw(mac, 4).unwrap_or_default(),
        broadcast: attrs.get(a::BROADCAST).and_then(|d| hw(d, 0)),
        vlan_id,
        qos,
        vlan_proto,
        tx_rate: setting(a::TX_RATE).unwrap_or(0),
        min_tx_rate,
        max_tx_rate,
        spoof_check: setting(a::SPOOFCHK).is_some_and(|v| v == 1),
        trust: setting(a::TRUST).is_some_and(|v| v == 1),
        link_state: setting(a::LINK_STATE)
            .map(VfLinkState::from)
            .unwrap_or_default(),
        query_rss: setting(a::RSS_QUERY_EN).is_some_and(|v| v == 1),
        ib_node_guid: attrs.get(a::IB_NODE_GUID).and_then(vf_guid),
        ib_port_guid: attrs.get(a::IB_PORT_GUID).and_then(vf_guid),
        state: attrs.get(a::STATS).map(decode_stats).unwrap_or_default(),
    })
}

fn decode_stats(data: &[u8]) -> VfState {
    use ifla_vf_stats as s;

    let attrs = AttrMap::new(data);
    let counter = |kind| attrs.u64(kind).unwrap_or(0);
    VfState {
        rx_packets: counter(s::RX_PACKETS),
        tx_packets: counter(s::TX_PACKETS),
        rx_bytes: counter(s::RX_BYTES),
        tx_bytes: counter(s::TX_BYTES),
        broadcast: counter(s::BROADCAST),
        multicast: counter(s::MULTICAST),
        rx_dropped: counter(s::RX_DROPPED),
        tx_dropped: counter(s::TX_DROPPED),
    }
}
