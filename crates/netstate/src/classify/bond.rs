//! Bond controller (IFLA_BOND_*) and bond port (IFLA_BOND_SLAVE_*) data.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{DecodeError, addr_list};
use crate::netlink::attr::{AttrMap, get};
use crate::state::{
    BondAdInfo, BondAdSelect, BondAllSubordinatesActive, BondArpAllTargets, BondArpValidate,
    BondFailOverMac, BondInfo, BondLacpRate, BondMiiStatus, BondMode, BondPrimaryReselect,
    BondSubordinateInfo, BondSubordinateState, BondXmitHashPolicy,
};

pub(crate) mod ifla_bond {
    pub const MODE: u16 = 1;
    pub const MIIMON: u16 = 3;
    pub const UPDELAY: u16 = 4;
    pub const DOWNDELAY: u16 = 5;
    pub const USE_CARRIER: u16 = 6;
    pub const ARP_INTERVAL: u16 = 7;
    pub const ARP_IP_TARGET: u16 = 8;
    pub const ARP_VALIDATE: u16 = 9;
    pub const ARP_ALL_TARGETS: u16 = 10;
    pub const PRIMARY: u16 = 11;
    pub const PRIMARY_RESELECT: u16 = 12;
    pub const FAIL_OVER_MAC: u16 = 13;
    pub const XMIT_HASH_POLICY: u16 = 14;
    pub const RESEND_IGMP: u16 = 15;
    pub const NUM_PEER_NOTIF: u16 = 16;
    pub const ALL_SLAVES_ACTIVE: u16 = 17;
    pub const MIN_LINKS: u16 = 18;
    pub const LP_INTERVAL: u16 = 19;
    pub const PACKETS_PER_SLAVE: u16 = 20;
    pub const AD_LACP_RATE: u16 = 21;
    pub const AD_SELECT: u16 = 22;
    pub const AD_INFO: u16 = 23;
    pub const AD_ACTOR_SYS_PRIO: u16 = 24;
    pub const AD_USER_PORT_KEY: u16 = 25;
    pub const AD_ACTOR_SYSTEM: u16 = 26;
    pub const TLB_DYNAMIC_LB: u16 = 27;
    pub const PEER_NOTIF_DELAY: u16 = 28;
    pub const AD_LACP_ACTIVE: u16 = 29;
    pub const MISSED_MAX: u16 = 30;
    pub const NS_IP6_TARGET: u16 = 31;
}

mod ifla_bond_ad_info {
    pub const AGGREGATOR: u16 = 1;
    pub const NUM_PORTS: u16 = 2;
    pub const ACTOR_KEY: u16 = 3;
    pub const PARTNER_KEY: u16 = 4;
    pub const PARTNER_MAC: u16 = 5;
}

pub(crate) mod ifla_bond_slave {
    pub const STATE: u16 = 1;
    pub const MII_STATUS: u16 = 2;
    pub const LINK_FAILURE_COUNT: u16 = 3;
    pub const PERM_HWADDR: u16 = 4;
    pub const QUEUE_ID: u16 = 5;
    pub const AD_AGGREGATOR_ID: u16 = 6;
    pub const AD_ACTOR_OPER_PORT_STATE: u16 = 7;
    pub const AD_PARTNER_OPER_PORT_STATE: u16 = 8;
    pub const PRIO: u16 = 9;
}

/// Decode IFLA_INFO_DATA of a bond.
///
/// The kernel reports every option regardless of mode; options the
/// current mode ignores are dropped so the record shows what is in effect.
pub(crate) fn decode(data: &[u8]) -> Result<BondInfo, DecodeError> {
    use BondMode::*;
    use ifla_bond as a;

    let attrs = AttrMap::new(data);
    let mode = attrs
        .u8(a::MODE)
        .map(BondMode::from)
        .ok_or_else(|| DecodeError::missing("bond", "IFLA_BOND_MODE"))?;
    let in_modes = |modes: &[BondMode]| modes.contains(&mode);
    let is_8023ad = mode == Ieee8021Ad;

    let mut info = BondInfo {
        mode,
        miimon: attrs.u32(a::MIIMON),
        updelay: attrs.u32(a::UPDELAY),
        downdelay: attrs.u32(a::DOWNDELAY),
        use_carrier: attrs.bool(a::USE_CARRIER),
        arp_interval: attrs.u32(a::ARP_INTERVAL),
        arp_validate: attrs.u32(a::ARP_VALIDATE).map(BondArpValidate::from),
        arp_all_targets: attrs.u32(a::ARP_ALL_TARGETS).map(BondArpAllTargets::from),
        primary_reselect: attrs.u8(a::PRIMARY_RESELECT).map(BondPrimaryReselect::from),
        all_subordinates_active: attrs
            .u8(a::ALL_SLAVES_ACTIVE)
            .map(BondAllSubordinatesActive::from),
        min_links: attrs.u32(a::MIN_LINKS),
        lp_interval: attrs.u32(a::LP_INTERVAL),
        peer_notif_delay: attrs.u32(a::PEER_NOTIF_DELAY),
        ..Default::default()
    };

    if let Some(targets) = attrs.get(a::ARP_IP_TARGET) {
        info.arp_ip_target = Some(addr_list(targets, |d| {
            <[u8; 4]>::try_from(d).ok().map(Ipv4Addr::from)
        }));
    }
    if let Some(targets) = attrs.get(a::NS_IP6_TARGET) {
        info.ns_ip6_target = Some(addr_list(targets, |d| {
            <[u8; 16]>::try_from(d).ok().map(Ipv6Addr::from)
        }));
    }
    if !in_modes(&[Ieee8021Ad, BalanceTlb, BalanceAlb]) {
        info.arp_missed_max = attrs.u8(a::MISSED_MAX);
    }
    if in_modes(&[ActiveBackup, BalanceAlb, BalanceTlb]) {
        info.primary = attrs.u32(a::PRIMARY).map(|idx| idx.to_string());
    }
    if mode == ActiveBackup {
        info.fail_over_mac = attrs.u8(a::FAIL_OVER_MAC).map(BondFailOverMac::from);
        if let Some(n) = attrs.u8(a::NUM_PEER_NOTIF) {
            info.num_unsol_na = Some(n);
            info.num_grat_arp = Some(n);
        }
    }
    if in_modes(&[BalanceXor, Ieee8021Ad, BalanceTlb]) {
        info.xmit_hash_policy = attrs.u8(a::XMIT_HASH_POLICY).map(BondXmitHashPolicy::from);
    }
    if in_modes(&[BalanceRoundRobin, ActiveBackup, BalanceTlb, BalanceAlb]) {
        info.resend_igmp = attrs.u32(a::RESEND_IGMP);
    }
    if mode == BalanceRoundRobin {
        info.packets_per_subordinate = attrs.u32(a::PACKETS_PER_SLAVE);
    }
    if in_modes(&[BalanceTlb, BalanceAlb]) {
        info.tlb_dynamic_lb = attrs.bool(a::TLB_DYNAMIC_LB);
    }
    if is_8023ad {
        info.lacp_rate = attrs.u8(a::AD_LACP_RATE).map(BondLacpRate::from);
        info.lacp_active = attrs.bool(a::AD_LACP_ACTIVE);
        info.ad_select = attrs.u8(a::AD_SELECT).map(BondAdSelect::from);
        info.ad_actor_sys_prio = attrs.u16(a::AD_ACTOR_SYS_PRIO);
        info.ad_user_port_key = attrs.u16(a::AD_USER_PORT_KEY);
        info.ad_actor_system = attrs.mac(a::AD_ACTOR_SYSTEM);
    }
    info.ad_info = attrs.get(a::AD_INFO).map(decode_ad_info);

    Ok(info)
}

fn decode_ad_info(data: &[u8]) -> BondAdInfo {
    use ifla_bond_ad_info as a;

    let attrs = AttrMap::new(data);
    BondAdInfo {
        aggregator: attrs.u16(a::AGGREGATOR).unwrap_or(0),
        num_ports: attrs.u16(a::NUM_PORTS).unwrap_or(0),
        actor_key: attrs.u16(a::ACTOR_KEY).unwrap_or(0),
        partner_key: attrs.u16(a::PARTNER_KEY).unwrap_or(0),
        partner_mac: attrs.mac(a::PARTNER_MAC).unwrap_or_default(),
    }
}

/// Decode IFLA_INFO_SLAVE_DATA of a bond port.
pub(crate) fn decode_subordinate(data: &[u8]) -> BondSubordinateInfo {
    use ifla_bond_slave as a;

    let attrs = AttrMap::new(data);
    BondSubordinateInfo {
        subordinate_state: BondSubordinateState::from(attrs.u8(a::STATE).unwrap_or(0)),
        mii_status: attrs
            .u8(a::MII_STATUS)
            .map(BondMiiStatus::from)
            .unwrap_or_default(),
        link_failure_count: attrs.u32(a::LINK_FAILURE_COUNT).unwrap_or(0),
        perm_hwaddr: attrs.get(a::PERM_HWADDR).map(get::mac).unwrap_or_default(),
        queue_id: attrs.u16(a::QUEUE_ID).unwrap_or(0),
        prio: attrs.get(a::PRIO).and_then(|d| get::i32_ne(d).ok()),
        ad_aggregator_id: attrs.u16(a::AD_AGGREGATOR_ID),
        ad_actor_oper_port_state: attrs.u8(a::AD_ACTOR_OPER_PORT_STATE),
        ad_partner_oper_port_state: attrs.u16(a::AD_PARTNER_OPER_PORT_STATE),
    }
}
