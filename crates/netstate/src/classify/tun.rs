use crate::netlink::attr::AttrMap;
use crate::state::{TunInfo, TunMode};

pub(crate) mod ifla_tun {
    pub const OWNER: u16 = 1;
    pub const GROUP: u16 = 2;
    pub const TYPE: u16 = 3;
    pub const PI: u16 = 4;
    pub const VNET_HDR: u16 = 5;
    pub const PERSIST: u16 = 6;
    pub const MULTI_QUEUE: u16 = 7;
    pub const NUM_QUEUES: u16 = 8;
    pub const NUM_DISABLED_QUEUES: u16 = 9;
}

/// Decode IFLA_INFO_DATA of a tun/tap device. An owner or group of
/// `u32::MAX` means none is set.
pub(crate) fn decode(data: &[u8]) -> TunInfo {
    use ifla_tun as a;

    let attrs = AttrMap::new(data);
    let flag = |kind| attrs.bool(kind).unwrap_or(false);
    let id = |kind| attrs.u32(kind).filter(|v| *v != u32::MAX);

    TunInfo {
        mode: attrs.u8(a::TYPE).map(TunMode::from).unwrap_or_default(),
        owner: id(a::OWNER),
        group: id(a::GROUP),
        pi: flag(a::PI),
        vnet_hdr: flag(a::VNET_HDR),
        multi_queue: flag(a::MULTI_QUEUE),
        persist: flag(a::PERSIST),
        num_queues: attrs.u32(a::NUM_QUEUES),
        num_disabled_queues: attrs.u32(a::NUM_DISABLED_QUEUES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_decode_tap() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_u32(ifla_tun::OWNER, 1000);
            b.append_attr_u32(ifla_tun::GROUP, u32::MAX);
            b.append_attr_u8(ifla_tun::TYPE, 2);
            b.append_attr_u8(ifla_tun::PERSIST, 1);
            b.append_attr_u32(ifla_tun::NUM_QUEUES, 1);
        });
        let info = decode(&data);
        assert_eq!(info.mode, TunMode::Tap);
        assert_eq!(info.owner, Some(1000));
        assert!(info.group.is_none());
        assert!(info.persist);
        assert!(!info.pi);
        assert_eq!(info.num_queues, Some(1));
    }
}
