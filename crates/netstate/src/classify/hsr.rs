use crate::netlink::attr::AttrMap;
use crate::state::{HsrInfo, HsrProtocol};

pub(crate) mod ifla_hsr {
    pub const SLAVE1: u16 = 1;
    pub const SLAVE2: u16 = 2;
    pub const MULTICAST_SPEC: u16 = 3;
    pub const SUPERVISION_ADDR: u16 = 4;
    pub const SEQ_NR: u16 = 5;
    pub const VERSION: u16 = 6;
    pub const PROTOCOL: u16 = 7;
}

/// Decode IFLA_INFO_DATA of an HSR/PRP device. Ports are ifindex strings
/// until resolved.
pub(crate) fn decode(data: &[u8]) -> HsrInfo {
    use ifla_hsr as a;

    let attrs = AttrMap::new(data);
    let port = |kind| attrs.u32(kind).map(|idx| idx.to_string());

    HsrInfo {
        port1: port(a::SLAVE1),
        port2: port(a::SLAVE2),
        supervision_addr: attrs.mac(a::SUPERVISION_ADDR).unwrap_or_default(),
        seq_nr: attrs.u16(a::SEQ_NR).unwrap_or(0),
        multicast_spec: attrs.u8(a::MULTICAST_SPEC).unwrap_or(0),
        version: attrs.u8(a::VERSION).unwrap_or(0),
        protocol: attrs
            .u8(a::PROTOCOL)
            .map(HsrProtocol::from)
            .unwrap_or_default(),
    }
}
