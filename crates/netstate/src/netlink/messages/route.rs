//! Strongly-typed route message.

use std::net::IpAddr;

use winnow::prelude::*;

use crate::netlink::attr::{AttrIter, NLA_TYPE_MASK, get, nla_align};
use crate::netlink::parse::{FromNetlink, PResult, parse_attrs, parse_header};
use crate::netlink::types::family::{AF_INET, AF_INET6};
use crate::netlink::types::route::{RtMsg, RtNextHop, RtaCacheInfo, rta};

/// One entry of RTA_MULTIPATH, in kernel order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NextHopMessage {
    pub flags: u8,
    /// rtnh_hops; the configured weight is this plus one.
    pub hops: u8,
    pub ifindex: u32,
    pub gateway: Option<IpAddr>,
    pub via: Option<IpAddr>,
}

/// Route message with all attributes parsed.
#[derive(Debug, Clone, Default)]
pub struct RouteMessage {
    /// Fixed-size header.
    pub header: RtMsg,
    pub destination: Option<IpAddr>,
    pub source: Option<IpAddr>,
    pub iif: Option<u32>,
    pub oif: Option<u32>,
    pub gateway: Option<IpAddr>,
    /// RTA_PRIORITY, the route metric.
    pub priority: Option<u32>,
    pub prefsrc: Option<IpAddr>,
    /// RTA_METRICS nest, raw RTAX_* attributes.
    pub metrics: Option<Vec<u8>>,
    pub multipath: Vec<NextHopMessage>,
    /// RTA_FLOW, the realm.
    pub flow: Option<u32>,
    pub cache_info: Option<RtaCacheInfo>,
    /// RTA_TABLE, supersedes the header byte.
    pub table: Option<u32>,
    pub mark: Option<u32>,
    pub via: Option<IpAddr>,
    pub pref: Option<u8>,
    pub uid: Option<u32>,
}

impl RouteMessage {
    /// Address family.
    pub fn family(&self) -> u8 {
        self.header.rtm_family
    }

    /// Routing table id.
    pub fn table_id(&self) -> u32 {
        self.table.unwrap_or(self.header.rtm_table as u32)
    }
}

/// Decode struct rtvia: a u16 family followed by the address bytes.
fn parse_via(data: &[u8]) -> Option<IpAddr> {
    let family = get::u16_ne(data).ok()? as u8;
    let addr = data.get(2..)?;
    match family {
        AF_INET => get::ip_addr(addr.get(..4)?),
        AF_INET6 => get::ip_addr(addr.get(..16)?),
        _ => None,
    }
}

/// Walk the rtnexthop array of RTA_MULTIPATH.
fn parse_multipath(mut data: &[u8]) -> Vec<NextHopMessage> {
    let mut hops = Vec::new();
    while data.len() >= RtNextHop::SIZE {
        let Ok(rtnh) = RtNextHop::from_bytes(data) else {
            break;
        };
        let len = rtnh.rtnh_len as usize;
        if len < RtNextHop::SIZE || len > data.len() {
            break;
        }

        let mut hop = NextHopMessage {
            flags: rtnh.rtnh_flags,
            hops: rtnh.rtnh_hops,
            ifindex: rtnh.rtnh_ifindex as u32,
            ..Default::default()
        };
        for (kind, payload) in AttrIter::new(&data[RtNextHop::SIZE..len]) {
            match kind {
                rta::GATEWAY => hop.gateway = get::ip_addr(payload),
                rta::VIA => hop.via = parse_via(payload),
                _ => {}
            }
        }
        hops.push(hop);

        let next = nla_align(len);
        data = data.get(next..).unwrap_or(&[]);
    }
    hops
}

impl FromNetlink for RouteMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(RtMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, RtMsg::SIZE)?;
        let header = RtMsg::from_bytes(header_bytes)
            .map_err(|_| winnow::error::ErrMode::Cut(winnow::error::ContextError::new()))?;

        let mut msg = RouteMessage {
            header,
            ..Default::default()
        };

        for (attr_type, data) in parse_attrs(input)? {
            match attr_type & NLA_TYPE_MASK {
                rta::DST => msg.destination = get::ip_addr(data),
                rta::SRC => msg.source = get::ip_addr(data),
                rta::IIF => msg.iif = get::u32_ne(data).ok(),
                rta::OIF => msg.oif = get::u32_ne(data).ok(),
                rta::GATEWAY => msg.gateway = get::ip_addr(data),
                rta::PRIORITY => msg.priority = get::u32_ne(data).ok(),
                rta::PREFSRC => msg.prefsrc = get::ip_addr(data),
                rta::METRICS => msg.metrics = Some(data.to_vec()),
                rta::MULTIPATH => msg.multipath = parse_multipath(data),
                rta::FLOW => msg.flow = get::u32_ne(data).ok(),
                rta::CACHEINFO => msg.cache_info = RtaCacheInfo::from_bytes(data).ok(),
                rta::TABLE => msg.table = get::u32_ne(data).ok(),
                rta::MARK => msg.mark = get::u32_ne(data).ok(),
                rta::VIA => msg.via = parse_via(data),
                rta::PREF => msg.pref = get::u8(data).ok(),
                rta::UID => msg.uid = get::u32_ne(data).ok(),
                _ => {}
            }
        }

        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;

    fn nexthop(ifindex: i32, hops: u8, gw: [u8; 4]) -> Vec<u8> {
        let attrs = MessageBuilder::attrs(|b| b.append_attr(rta::GATEWAY, &gw));
        let rtnh = RtNextHop {
            rtnh_len: (RtNextHop::SIZE + attrs.len()) as u16,
            rtnh_flags: 0,
            rtnh_hops: hops,
            rtnh_ifindex: ifindex,
        };
        let mut buf = rtnh.as_bytes().to_vec();
        buf.extend(attrs);
        buf
    }

    #[test]
    fn test_parse_multipath_keeps_order() {
        let mut mp = nexthop(3, 0, [192, 0, 2, 1]);
        mp.extend(nexthop(2, 4, [192, 0, 2, 2]));

        let hdr = RtMsg::new().with_family(AF_INET);
        let mut data = hdr.as_bytes().to_vec();
        data.extend(MessageBuilder::attrs(|b| {
            b.append_attr_u32(rta::TABLE, 254);
            b.append_attr(rta::MULTIPATH, &mp);
        }));

        let msg = RouteMessage::from_bytes(&data).unwrap();
        assert_eq!(msg.table_id(), 254);
        assert_eq!(msg.multipath.len(), 2);
        assert_eq!(msg.multipath[0].ifindex, 3);
        assert_eq!(msg.multipath[1].ifindex, 2);
        assert_eq!(msg.multipath[1].hops, 4);
        assert_eq!(msg.multipath[1].gateway, Some("192.0.2.2".parse().unwrap()));
    }

    #[test]
    fn test_parse_via_ipv6() {
        let mut via = (AF_INET6 as u16).to_ne_bytes().to_vec();
        via.extend_from_slice(&"fe80::1".parse::<std::net::Ipv6Addr>().unwrap().octets());
        assert_eq!(parse_via(&via), Some("fe80::1".parse().unwrap()));
        assert_eq!(parse_via(&[1, 0]), None);
    }
}
