//! Bridge controller (IFLA_BR_*), bridge port (IFLA_BRPORT_*) and bridge
//! VLAN (AF_BRIDGE IFLA_AF_SPEC) data.

use crate::netlink::attr::{AttrIter, AttrMap, get};
use crate::netlink::types::link::ifla_bridge;
use crate::state::{
    BridgeInfo, BridgePortInfo, BridgePortMulticastRouterType, BridgePortStpState, BridgeStpState,
    BridgeVlanEntry, BridgeVlanProtocol, format_bridge_id,
};

pub(crate) mod ifla_br {
    pub const FORWARD_DELAY: u16 = 1;
    pub const HELLO_TIME: u16 = 2;
    pub const MAX_AGE: u16 = 3;
    pub const AGEING_TIME: u16 = 4;
    pub const STP_STATE: u16 = 5;
    pub const PRIORITY: u16 = 6;
    pub const VLAN_FILTERING: u16 = 7;
    pub const VLAN_PROTOCOL: u16 = 8;
    pub const GROUP_FWD_MASK: u16 = 9;
    pub const ROOT_ID: u16 = 10;
    pub const BRIDGE_ID: u16 = 11;
    pub const ROOT_PORT: u16 = 12;
    pub const ROOT_PATH_COST: u16 = 13;
    pub const TOPOLOGY_CHANGE: u16 = 14;
    pub const TOPOLOGY_CHANGE_DETECTED: u16 = 15;
    pub const HELLO_TIMER: u16 = 16;
    pub const TCN_TIMER: u16 = 17;
    pub const TOPOLOGY_CHANGE_TIMER: u16 = 18;
    pub const GC_TIMER: u16 = 19;
    pub const GROUP_ADDR: u16 = 20;
    pub const MCAST_SNOOPING: u16 = 23;
    pub const MCAST_QUERIER: u16 = 25;
    pub const NF_CALL_IPTABLES: u16 = 36;
    pub const NF_CALL_IP6TABLES: u16 = 37;
    pub const NF_CALL_ARPTABLES: u16 = 38;
    pub const VLAN_DEFAULT_PVID: u16 = 39;
}

pub(crate) mod ifla_brport {
    pub const STATE: u16 = 1;
    pub const PRIORITY: u16 = 2;
    pub const COST: u16 = 3;
    pub const MODE: u16 = 4;
    pub const GUARD: u16 = 5;
    pub const PROTECT: u16 = 6;
    pub const FAST_LEAVE: u16 = 7;
    pub const LEARNING: u16 = 8;
    pub const UNICAST_FLOOD: u16 = 9;
    pub const PROXYARP: u16 = 10;
    pub const PROXYARP_WIFI: u16 = 12;
    pub const ROOT_ID: u16 = 13;
    pub const BRIDGE_ID: u16 = 14;
    pub const DESIGNATED_PORT: u16 = 15;
    pub const DESIGNATED_COST: u16 = 16;
    pub const ID: u16 = 17;
    pub const NO: u16 = 18;
    pub const TOPOLOGY_CHANGE_ACK: u16 = 19;
    pub const CONFIG_PENDING: u16 = 20;
    pub const MESSAGE_AGE_TIMER: u16 = 21;
    pub const FORWARD_DELAY_TIMER: u16 = 22;
    pub const HOLD_TIMER: u16 = 23;
    pub const MULTICAST_ROUTER: u16 = 25;
    pub const MCAST_FLOOD: u16 = 27;
    pub const MCAST_TO_UCAST: u16 = 28;
    pub const VLAN_TUNNEL: u16 = 29;
    pub const BCAST_FLOOD: u16 = 30;
    pub const GROUP_FWD_MASK: u16 = 31;
    pub const NEIGH_SUPPRESS: u16 = 32;
    pub const ISOLATED: u16 = 33;
    pub const BACKUP_PORT: u16 = 34;
}

/// Decode IFLA_INFO_DATA of a bridge. No attribute is required.
pub(crate) fn decode(data: &[u8]) -> BridgeInfo {
    use ifla_br as a;

    let attrs = AttrMap::new(data);
    BridgeInfo {
        ports: Vec::new(),
        stp_state: attrs.u32(a::STP_STATE).map(BridgeStpState::from),
        hello_time: attrs.u32(a::HELLO_TIME),
        forward_delay: attrs.u32(a::FORWARD_DELAY),
        max_age: attrs.u32(a::MAX_AGE),
        ageing_time: attrs.u32(a::AGEING_TIME),
        priority: attrs.u16(a::PRIORITY),
        bridge_id: attrs.get(a::BRIDGE_ID).and_then(format_bridge_id),
        root_id: attrs.get(a::ROOT_ID).and_then(format_bridge_id),
        root_port: attrs.u16(a::ROOT_PORT),
        root_path_cost: attrs.u32(a::ROOT_PATH_COST),
        topology_change: attrs.bool(a::TOPOLOGY_CHANGE),
        topology_change_detected: attrs.bool(a::TOPOLOGY_CHANGE_DETECTED),
        hello_timer: attrs.u64(a::HELLO_TIMER),
        tcn_timer: attrs.u64(a::TCN_TIMER),
        topology_change_timer: attrs.u64(a::TOPOLOGY_CHANGE_TIMER),
        gc_timer: attrs.u64(a::GC_TIMER),
        group_fwd_mask: attrs.u16(a::GROUP_FWD_MASK),
        group_addr: attrs.mac(a::GROUP_ADDR),
        vlan_filtering: attrs.bool(a::VLAN_FILTERING),
        vlan_protocol: attrs.u16_be(a::VLAN_PROTOCOL).map(BridgeVlanProtocol::from),
        default_pvid: attrs.u16(a::VLAN_DEFAULT_PVID),
        multicast_snooping: attrs.bool(a::MCAST_SNOOPING),
        multicast_querier: attrs.bool(a::MCAST_QUERIER),
        nf_call_iptables: attrs.bool(a::NF_CALL_IPTABLES),
        nf_call_ip6tables: attrs.bool(a::NF_CALL_IP6TABLES),
        nf_call_arptables: attrs.bool(a::NF_CALL_ARPTABLES),
    }
}

/// Decode IFLA_INFO_SLAVE_DATA of a bridge port.
pub(crate) fn decode_port(data: &[u8]) -> BridgePortInfo {
    use ifla_brport as a;

    let attrs = AttrMap::new(data);
    let flag = |kind| attrs.bool(kind).unwrap_or(false);
    let timer = |kind| attrs.u64(kind).unwrap_or(0);
    let bridge_id = |kind| {
        attrs
            .get(kind)
            .and_then(format_bridge_id)
            .unwrap_or_default()
    };

    BridgePortInfo {
        stp_state: attrs
            .u8(a::STATE)
            .map(BridgePortStpState::from)
            .unwrap_or_default(),
        stp_priority: attrs.u16(a::PRIORITY).unwrap_or(0),
        stp_path_cost: attrs.u32(a::COST).unwrap_or(0),
        hairpin_mode: flag(a::MODE),
        bpdu_guard: flag(a::GUARD),
        root_block: flag(a::PROTECT),
        multicast_fast_leave: flag(a::FAST_LEAVE),
        learning: flag(a::LEARNING),
        unicast_flood: flag(a::UNICAST_FLOOD),
        proxyarp: flag(a::PROXYARP),
        proxyarp_wifi: flag(a::PROXYARP_WIFI),
        designated_root: bridge_id(a::ROOT_ID),
        designated_bridge: bridge_id(a::BRIDGE_ID),
        designated_port: attrs.u16(a::DESIGNATED_PORT).unwrap_or(0),
        designated_cost: attrs.u16(a::DESIGNATED_COST).unwrap_or(0),
        port_id: format!("0x{:04x}", attrs.u16(a::ID).unwrap_or(0)),
        port_no: format!("0x{:x}", attrs.u16(a::NO).unwrap_or(0)),
        change_ack: flag(a::TOPOLOGY_CHANGE_ACK),
        config_pending: flag(a::CONFIG_PENDING),
        message_age_timer: timer(a::MESSAGE_AGE_TIMER),
        forward_delay_timer: timer(a::FORWARD_DELAY_TIMER),
        hold_timer: timer(a::HOLD_TIMER),
        multicast_router: attrs
            .u8(a::MULTICAST_ROUTER)
            .map(BridgePortMulticastRouterType::from)
            .unwrap_or_default(),
        multicast_flood: flag(a::MCAST_FLOOD),
        multicast_to_unicast: flag(a::MCAST_TO_UCAST),
        vlan_tunnel: flag(a::VLAN_TUNNEL),
        broadcast_flood: flag(a::BCAST_FLOOD),
        group_fwd_mask: attrs.u16(a::GROUP_FWD_MASK).unwrap_or(0),
        neigh_suppress: flag(a::NEIGH_SUPPRESS),
        isolated: flag(a::ISOLATED),
        backup_port: attrs.u32(a::BACKUP_PORT).map(|idx| idx.to_string()),
        vlans: None,
    }
}

/// Decode the IFLA_BRIDGE_VLAN_INFO entries of an AF_BRIDGE link.
///
/// Each entry is `struct bridge_vlan_info { u16 flags; u16 vid; }`. With
/// compressed dumps a range arrives as a RANGE_BEGIN entry followed by a
/// RANGE_END entry.
pub fn decode_vlans(af_spec: &[u8]) -> Vec<BridgeVlanEntry> {
    let mut entries = Vec::new();
    let mut range_start: Option<u16> = None;

    for (kind, payload) in AttrIter::new(af_spec) {
        if kind != ifla_bridge::VLAN_INFO {
            continue;
        }
        let (Ok(flags), Some(vid)) = (
            get::u16_ne(payload),
            payload.get(2..4).and_then(|d| get::u16_ne(d).ok()),
        ) else {
            continue;
        };

        if flags & ifla_bridge::VLAN_INFO_RANGE_BEGIN != 0 {
            range_start = Some(vid);
            continue;
        }
        let is_pvid = flags & ifla_bridge::VLAN_INFO_PVID != 0;
        let is_egress_untagged = flags & ifla_bridge::VLAN_INFO_UNTAGGED != 0;

        let entry = match range_start.take() {
            Some(start) if flags & ifla_bridge::VLAN_INFO_RANGE_END != 0 => BridgeVlanEntry {
                vid: None,
                vid_range: Some((start, vid)),
                is_pvid,
                is_egress_untagged,
            },
            _ => BridgeVlanEntry {
                vid: Some(vid),
                vid_range: None,
                is_pvid,
                is_egress_untagged,
            },
        };
        entries.push(entry);
    }

    entries
}
