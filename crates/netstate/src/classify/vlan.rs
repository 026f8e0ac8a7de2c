use super::DecodeError;
use crate::netlink::attr::{AttrMap, get};
use crate::state::{VlanInfo, VlanProtocol};

pub(crate) mod ifla_vlan {
    pub const ID: u16 = 1;
    pub const FLAGS: u16 = 2;
    pub const PROTOCOL: u16 = 5;
}

pub(crate) mod vlan_flag {
    pub const REORDER_HDR: u32 = 0x1;
    pub const GVRP: u32 = 0x2;
    pub const LOOSE_BINDING: u32 = 0x4;
    pub const MVRP: u32 = 0x8;
    pub const BRIDGE_BINDING: u32 = 0x10;
}

/// Decode IFLA_INFO_DATA of a vlan. `base` is the parent's ifindex.
pub(crate) fn decode(data: &[u8], base: Option<String>) -> Result<VlanInfo, DecodeError> {
    let attrs = AttrMap::new(data);
    let vlan_id = attrs
        .u16(ifla_vlan::ID)
        .ok_or_else(|| DecodeError::missing("vlan", "IFLA_VLAN_ID"))?;

    // struct ifla_vlan_flags { u32 flags; u32 mask; }
    let flags = attrs
        .get(ifla_vlan::FLAGS)
        .and_then(|d| get::u32_ne(d).ok())
        .unwrap_or(0);
    let has = |bit: u32| flags & bit != 0;

    Ok(VlanInfo {
        vlan_id,
        protocol: attrs
            .u16_be(ifla_vlan::PROTOCOL)
            .map(VlanProtocol::from)
            .unwrap_or_default(),
        base_iface: base.unwrap_or_default(),
        is_reorder_hdr: has(vlan_flag::REORDER_HDR),
        is_gvrp: has(vlan_flag::GVRP),
        is_loose_binding: has(vlan_flag::LOOSE_BINDING),
        is_mvrp: has(vlan_flag::MVRP),
        is_bridge_binding: has(vlan_flag::BRIDGE_BINDING),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_decode_vlan() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_u16(ifla_vlan::ID, 100);
            let mut flags = Vec::new();
            flags.extend_from_slice(&(vlan_flag::REORDER_HDR | vlan_flag::MVRP).to_ne_bytes());
            flags.extend_from_slice(&u32::MAX.to_ne_bytes());
            b.append_attr(ifla_vlan::FLAGS, &flags);
            b.append_attr_u16_be(ifla_vlan::PROTOCOL, 0x88a8);
        });
        let info = decode(&data, Some("3".into())).unwrap();
        assert_eq!(info.vlan_id, 100);
        assert_eq!(info.protocol, VlanProtocol::Ieee8021Ad);
        assert_eq!(info.base_iface, "3");
        assert!(info.is_reorder_hdr && info.is_mvrp);
        assert!(!info.is_gvrp && !info.is_loose_binding && !info.is_bridge_binding);
    }

    #[test]
    fn test_vlan_defaults_to_8021q() {
        let data = MessageBuilder::attrs(|b| b.append_attr_u16(ifla_vlan::ID, 5));
        let info = decode(&data, None).unwrap();
        assert_eq!(info.protocol, VlanProtocol::Ieee8021Q);
        assert!(info.base_iface.is_empty());
    }

    #[test]
    fn test_vlan_id_required() {
        let err = decode(&[], Some("3".into())).unwrap_err();
        assert_eq!(err.attribute, "IFLA_VLAN_ID");
    }
}
