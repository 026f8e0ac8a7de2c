use super::DecodeError;
use crate::netlink::attr::{AttrMap, get};
use crate::state::VxlanInfo;

pub(crate) mod ifla_vxlan {
    pub const ID: u16 = 1;
    pub const GROUP: u16 = 2;
    pub const LINK: u16 = 3;
    pub const LOCAL: u16 = 4;
    pub const TTL: u16 = 5;
    pub const TOS: u16 = 6;
    pub const LEARNING: u16 = 7;
    pub const AGEING: u16 = 8;
    pub const LIMIT: u16 = 9;
    pub const PORT_RANGE: u16 = 10;
    pub const PROXY: u16 = 11;
    pub const RSC: u16 = 12;
    pub const L2MISS: u16 = 13;
    pub const L3MISS: u16 = 14;
    pub const PORT: u16 = 15;
    pub const GROUP6: u16 = 16;
    pub const LOCAL6: u16 = 17;
    pub const UDP_CSUM: u16 = 18;
    pub const UDP_ZERO_CSUM6_TX: u16 = 19;
    pub const UDP_ZERO_CSUM6_RX: u16 = 20;
    pub const REMCSUM_TX: u16 = 21;
    pub const REMCSUM_RX: u16 = 22;
    pub const GBP: u16 = 23;
    pub const REMCSUM_NOPARTIAL: u16 = 24;
    pub const COLLECT_METADATA: u16 = 25;
    pub const LABEL: u16 = 26;
    pub const GPE: u16 = 27;
    pub const TTL_INHERIT: u16 = 28;
    pub const DF: u16 = 29;
}

/// Decode IFLA_INFO_DATA of a vxlan.
///
/// The underlay device comes from IFLA_VXLAN_LINK, not IFLA_LINK; zero means
/// no underlay. Remote and local prefer the IPv4 attribute when both exist.
pub(crate) fn decode(data: &[u8]) -> Result<VxlanInfo, DecodeError> {
    use ifla_vxlan as a;

    let attrs = AttrMap::new(data);
    let vxlan_id = attrs
        .u32(a::ID)
        .ok_or_else(|| DecodeError::missing("vxlan", "IFLA_VXLAN_ID"))?;
    let flag = |kind| attrs.bool(kind).unwrap_or(false);

    // struct ifla_vxlan_port_range { __be16 low; __be16 high; }
    let (src_port_min, src_port_max) = attrs
        .get(a::PORT_RANGE)
        .and_then(|d| {
            let low = get::u16_be(d).ok()?;
            let high = get::u16_be(d.get(2..)?).ok()?;
            Some((low, high))
        })
        .unwrap_or((0, 0));
    let dst_port = attrs.u16_be(a::PORT).unwrap_or(0);

    Ok(VxlanInfo {
        vxlan_id,
        base_iface: attrs
            .u32(a::LINK)
            .filter(|idx| *idx != 0)
            .map(|idx| idx.to_string()),
        remote: attrs.ip(a::GROUP).or_else(|| attrs.ip(a::GROUP6)),
        local: attrs.ip(a::LOCAL).or_else(|| attrs.ip(a::LOCAL6)),
        ttl: attrs.u8(a::TTL).unwrap_or(0),
        tos: attrs.u8(a::TOS).unwrap_or(0),
        label: attrs
            .get(a::LABEL)
            .and_then(|d| <[u8; 4]>::try_from(d).ok())
            .map(u32::from_be_bytes)
            .unwrap_or(0),
        df: attrs.u8(a::DF).unwrap_or(0),
        ttl_inherit: attrs.has(a::TTL_INHERIT),
        learning: flag(a::LEARNING),
        ageing: attrs.u32(a::AGEING).unwrap_or(0),
        max_address: attrs.u32(a::LIMIT).unwrap_or(0),
        src_port_min,
        src_port_max,
        dst_port,
        proxy: flag(a::PROXY),
        rsc: flag(a::RSC),
        l2miss: flag(a::L2MISS),
        l3miss: flag(a::L3MISS),
        udp_check_sum: flag(a::UDP_CSUM),
        udp6_zero_check_sum_tx: flag(a::UDP_ZERO_CSUM6_TX),
        udp6_zero_check_sum_rx: flag(a::UDP_ZERO_CSUM6_RX),
        remote_check_sum_tx: flag(a::REMCSUM_TX),
        remote_check_sum_rx: flag(a::REMCSUM_RX),
        remote_check_sum_no_partial: attrs.has(a::REMCSUM_NOPARTIAL),
        gbp: attrs.has(a::GBP),
        gpe: attrs.has(a::GPE),
        collect_metadata: flag(a::COLLECT_METADATA),
        dst_port_min: dst_port,
        dst_port_max: dst_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_decode_vxlan() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_u32(ifla_vxlan::ID, 101);
            b.append_attr(ifla_vxlan::GROUP, &[239, 1, 1, 1]);
            b.append_attr_u32(ifla_vxlan::LINK, 2);
            b.append_attr_u8(ifla_vxlan::LEARNING, 1);
            b.append_attr_u32(ifla_vxlan::AGEING, 300);
            let mut range = Vec::new();
            range.extend_from_slice(&1000u16.to_be_bytes());
            range.extend_from_slice(&2000u16.to_be_bytes());
            b.append_attr(ifla_vxlan::PORT_RANGE, &range);
            b.append_attr_u16_be(ifla_vxlan::PORT, 4789);
            b.append_attr_u8(ifla_vxlan::UDP_CSUM, 1);
            b.append_attr_empty(ifla_vxlan::GBP);
        });
        let info = decode(&data).unwrap();
        assert_eq!(info.vxlan_id, 101);
        assert_eq!(info.remote, Some("239.1.1.1".parse().unwrap()));
        assert!(info.local.is_none());
        assert_eq!(info.base_iface.as_deref(), Some("2"));
        assert!(info.learning);
        assert_eq!((info.src_port_min, info.src_port_max), (1000, 2000));
        assert_eq!(info.dst_port, 4789);
        assert_eq!(info.dst_port_min, 4789);
        assert_eq!(info.dst_port_max, 4789);
        assert!(info.udp_check_sum);
        assert!(info.gbp);
        assert!(!info.gpe);
    }

    #[test]
    fn test_vxlan_zero_link_has_no_base() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_u32(ifla_vxlan::ID, 7);
            b.append_attr_u32(ifla_vxlan::LINK, 0);
        });
        assert!(decode(&data).unwrap().base_iface.is_none());
    }

    #[test]
    fn test_vxlan_id_required() {
        assert!(decode(&[]).is_err());
    }
}
