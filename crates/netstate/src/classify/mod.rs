//! Interface classification.
//!
//! Turns one raw link message into an [`Iface`] with its type-specific
//! extension. Dispatch is a closed match on `IFLA_INFO_KIND`; kinds outside
//! the known set classify as `plain`.
//!
//! Decoders only fail when a field the kind cannot be described without is
//! missing. Everything else falls back to defaults. Index references
//! (`base_iface`, veth peer, bond primary, ...) are stored as decimal
//! strings here and renamed by the resolver once every link is known.

pub(crate) mod bond;
pub(crate) mod bridge;
pub(crate) mod hsr;
pub(crate) mod ipoib;
pub(crate) mod macsec;
pub(crate) mod macvlan;
pub(crate) mod tun;
pub(crate) mod vlan;
pub(crate) mod vrf;
pub(crate) mod vxlan;

use std::net::Ipv6Addr;

use crate::netlink::attr::{AttrIter, AttrMap, get};
use crate::netlink::messages::LinkMessage;
use crate::netlink::types::family::AF_INET6;
use crate::netlink::types::link::ifla_inet6;
use crate::state::{
    Extension, Iface, IfaceFlag, IfaceState, InterfaceType, Ipv6AddrGenMode, Ipv6Info, VethInfo,
};

/// A link whose kind-specific data lacks a required attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: missing required attribute {attribute}")]
pub struct DecodeError {
    /// Link kind being decoded.
    pub kind: &'static str,
    /// Name of the absent attribute.
    pub attribute: &'static str,
}

impl DecodeError {
    pub(crate) fn missing(kind: &'static str, attribute: &'static str) -> Self {
        Self { kind, attribute }
    }
}

/// Classify a link and decode its extension.
///
/// A `tun`, `veth` or `vrf` link reported without kind data classifies with
/// no extension rather than failing.
pub fn classify(link: &LinkMessage) -> Result<(InterfaceType, Option<Extension>), DecodeError> {
    let Some(kind) = link.kind.as_deref() else {
        return Ok((InterfaceType::Plain, None));
    };
    let data = link.info_data.as_deref().unwrap_or(&[]);
    let base = link.link.map(|idx| idx.to_string());

    let classified = match kind {
        "bond" => (
            InterfaceType::Bond,
            Some(Extension::Bond(bond::decode(data)?)),
        ),
        "bridge" => (
            InterfaceType::Bridge,
            Some(Extension::Bridge(bridge::decode(data))),
        ),
        "vlan" => (
            InterfaceType::Vlan,
            Some(Extension::Vlan(vlan::decode(data, base)?)),
        ),
        "vxlan" => (
            InterfaceType::Vxlan,
            Some(Extension::Vxlan(vxlan::decode(data)?)),
        ),
        "veth" => (
            InterfaceType::Veth,
            base.map(|peer| Extension::Veth(VethInfo { peer })),
        ),
        "tun" => (
            InterfaceType::Tun,
            link.info_data
                .as_deref()
                .map(|d| Extension::Tun(tun::decode(d))),
        ),
        "vrf" => (
            InterfaceType::Vrf,
            match link.info_data.as_deref() {
                Some(d) => Some(Extension::Vrf(vrf::decode(d)?)),
                None => None,
            },
        ),
        "macvlan" => (
            InterfaceType::MacVlan,
            Some(Extension::MacVlan(macvlan::decode("macvlan", data, base)?)),
        ),
        "macvtap" => (
            InterfaceType::MacVtap,
            Some(Extension::MacVtap(macvlan::decode("macvtap", data, base)?)),
        ),
        "macsec" => (
            InterfaceType::MacSec,
            Some(Extension::MacSec(macsec::decode(data, base))),
        ),
        "ipoib" => (
            InterfaceType::Ipoib,
            Some(Extension::Ipoib(ipoib::decode(data, base)?)),
        ),
        "hsr" => (
            InterfaceType::Hsr,
            Some(Extension::Hsr(hsr::decode(data))),
        ),
        _ => (InterfaceType::Plain, None),
    };
    Ok(classified)
}

/// Build the interface record for one link.
///
/// Addresses, controller data and per-device extras are attached later.
pub fn build_iface(link: &LinkMessage) -> Result<Iface, DecodeError> {
    let (iface_type, extension) = classify(link)?;

    let mut iface = Iface {
        name: link.name_or_empty().to_string(),
        index: link.ifindex(),
        iface_type,
        kind: link.kind.clone(),
        state: IfaceState::from(link.operstate.unwrap_or(0)),
        mtu: link.mtu.unwrap_or(0),
        min_mtu: link.min_mtu,
        max_mtu: link.max_mtu,
        flags: IfaceFlag::from_bits(link.flags()),
        mac_address: link.address.as_deref().map(get::mac).unwrap_or_default(),
        permanent_mac_address: link.perm_address.as_deref().map(get::mac),
        link_netnsid: link.link_netnsid,
        ..Default::default()
    };
    if let Some(ext) = extension {
        iface.set_extension(ext);
    }
    if let Some(af_spec) = link.af_spec.as_deref() {
        iface.ipv6 = inet6_settings(af_spec);
    }
    Ok(iface)
}

/// IPv6 interface settings from the AF_INET6 entry of IFLA_AF_SPEC.
///
/// The returned block has no addresses yet; the aggregator drops it again if
/// neither addresses nor a token end up on it.
fn inet6_settings(af_spec: &[u8]) -> Option<Ipv6Info> {
    let (_, inet6) = AttrIter::new(af_spec).find(|(family, _)| *family == AF_INET6 as u16)?;
    let attrs = AttrMap::new(inet6);

    let token = attrs
        .get(ifla_inet6::TOKEN)
        .and_then(|d| <[u8; 16]>::try_from(d).ok())
        .map(Ipv6Addr::from)
        .filter(|addr| !addr.is_unspecified());
    let addr_gen_mode = attrs.u8(ifla_inet6::ADDR_GEN_MODE).map(Ipv6AddrGenMode::from);

    Some(Ipv6Info {
        addresses: Vec::new(),
        token,
        addr_gen_mode,
    })
}

/// Decode a nest of fixed-size address entries, skipping malformed ones.
pub(crate) fn addr_list<T>(data: &[u8], parse: impl Fn(&[u8]) -> Option<T>) -> Vec<T> {
    AttrIter::new(data).filter_map(|(_, d)| parse(d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{LinkFixture, ifla_bond};
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_no_kind_is_plain() {
        let link = LinkFixture::new(2, "eth0").build();
        let (t, ext) = classify(&link).unwrap();
        assert_eq!(t, InterfaceType::Plain);
        assert!(ext.is_none());
    }

    #[test]
    fn test_unknown_kind_is_plain() {
        let link = LinkFixture::new(9, "wg0").kind("wireguard", |_| {}).build();
        let iface = build_iface(&link).unwrap();
        assert_eq!(iface.iface_type, InterfaceType::Plain);
        assert_eq!(iface.kind.as_deref(), Some("wireguard"));
        assert!(iface.extension_types().is_empty());
    }

    #[test]
    fn test_bond_without_mode_fails() {
        let link = LinkFixture::new(4, "bond0")
            .kind("bond", |b| b.append_attr_u32(ifla_bond::MIIMON, 100))
            .build();
        let err = classify(&link).unwrap_err();
        assert_eq!(err, DecodeError::missing("bond", "IFLA_BOND_MODE"));
        assert_eq!(err.to_string(), "bond: missing required attribute IFLA_BOND_MODE");
    }

    #[test]
    fn test_veth_peer_index() {
        let link = LinkFixture::new(7, "veth0")
            .link(8)
            .kind("veth", |_| {})
            .build();
        let iface = build_iface(&link).unwrap();
        assert_eq!(iface.iface_type, InterfaceType::Veth);
        assert_eq!(iface.veth.unwrap().peer, "8");
    }

    #[test]
    fn test_tun_without_data_has_no_extension() {
        let mut link = LinkFixture::new(12, "tap0").kind("tun", |_| {}).build();
        link.info_data = None;
        let iface = build_iface(&link).unwrap();
        assert_eq!(iface.iface_type, InterfaceType::Tun);
        assert!(iface.tun.is_none());
        assert!(iface.check_consistency().is_ok());
    }

    #[test]
    fn test_base_fields() {
        let link = LinkFixture::new(1, "lo")
            .mtu(65536)
            .flags(0x1 | 0x8 | 0x40)
            .address(&[0; 6])
            .build();
        let iface = build_iface(&link).unwrap();
        assert_eq!(iface.index, 1);
        assert_eq!(iface.mtu, 65536);
        assert_eq!(iface.mac_address, "00:00:00:00:00:00");
        assert_eq!(
            iface.flags,
            vec![IfaceFlag::Up, IfaceFlag::Loopback, IfaceFlag::Running]
        );
        assert_eq!(iface.state, IfaceState::Unknown);
    }

    #[test]
    fn test_inet6_token_and_mode() {
        let af_spec = MessageBuilder::attrs(|b| {
            let inet6 = b.nest_start(AF_INET6 as u16);
            let mut token = [0u8; 16];
            token[15] = 0x10;
            b.append_attr(ifla_inet6::TOKEN, &token);
            b.append_attr_u8(ifla_inet6::ADDR_GEN_MODE, 1);
            b.nest_end(inet6);
        });
        let info = inet6_settings(&af_spec).unwrap();
        assert_eq!(info.token, Some("::10".parse().unwrap()));
        assert_eq!(info.addr_gen_mode, Some(Ipv6AddrGenMode::None));
    }
}
