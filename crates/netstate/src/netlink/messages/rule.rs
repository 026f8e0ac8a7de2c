//! Strongly-typed routing rule message.

use std::net::IpAddr;

use winnow::prelude::*;

use crate::netlink::attr::{NLA_TYPE_MASK, get};
use crate::netlink::parse::{
    FromNetlink, PResult, parse_attrs, parse_header, parse_string_from_bytes,
};
use crate::netlink::types::rule::{FibRuleHdr, FibRulePortRange, fra};

/// Routing rule message with all attributes parsed.
#[derive(Debug, Clone, Default)]
pub struct RuleMessage {
    /// Fixed-size header.
    pub header: FibRuleHdr,
    pub priority: Option<u32>,
    pub source: Option<IpAddr>,
    pub destination: Option<IpAddr>,
    pub iifname: Option<String>,
    pub oifname: Option<String>,
    pub fwmark: Option<u32>,
    pub fwmask: Option<u32>,
    /// FRA_TABLE, supersedes the header byte.
    pub table: Option<u32>,
    pub goto: Option<u32>,
    pub flow: Option<u32>,
    pub tun_id: Option<u64>,
    pub suppress_ifgroup: Option<u32>,
    pub suppress_prefixlen: Option<u32>,
    pub l3mdev: Option<u8>,
    pub protocol: Option<u8>,
    pub ip_proto: Option<u8>,
    pub sport_range: Option<FibRulePortRange>,
    pub dport_range: Option<FibRulePortRange>,
}

impl RuleMessage {
    /// Address family.
    pub fn family(&self) -> u8 {
        self.header.family
    }

    /// Routing table id, zero when the rule has none.
    pub fn table_id(&self) -> u32 {
        self.table.unwrap_or(self.header.table as u32)
    }
}

impl FromNetlink for RuleMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(FibRuleHdr::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, FibRuleHdr::SIZE)?;
        let header = FibRuleHdr::from_bytes(header_bytes)
            .map_err(|_| winnow::error::ErrMode::Cut(winnow::error::ContextError::new()))?;

        let mut msg = RuleMessage {
            header,
            ..Default::default()
        };

        for (attr_type, data) in parse_attrs(input)? {
            match attr_type & NLA_TYPE_MASK {
                fra::PRIORITY => msg.priority = get::u32_ne(data).ok(),
                fra::SRC => msg.source = get::ip_addr(data),
                fra::DST => msg.destination = get::ip_addr(data),
                fra::IIFNAME => msg.iifname = Some(parse_string_from_bytes(data)),
                fra::OIFNAME => msg.oifname = Some(parse_string_from_bytes(data)),
                fra::FWMARK => msg.fwmark = get::u32_ne(data).ok(),
                fra::FWMASK => msg.fwmask = get::u32_ne(data).ok(),
                fra::TABLE => msg.table = get::u32_ne(data).ok(),
                fra::GOTO => msg.goto = get::u32_ne(data).ok(),
                fra::FLOW => msg.flow = get::u32_ne(data).ok(),
                fra::TUN_ID => msg.tun_id = get::u64_ne(data).ok().map(u64::from_be),
                fra::SUPPRESS_IFGROUP => msg.suppress_ifgroup = get::u32_ne(data).ok(),
                fra::SUPPRESS_PREFIXLEN => msg.suppress_prefixlen = get::u32_ne(data).ok(),
                fra::L3MDEV => msg.l3mdev = get::u8(data).ok(),
                fra::PROTOCOL => msg.protocol = get::u8(data).ok(),
                fra::IP_PROTO => msg.ip_proto = get::u8(data).ok(),
                fra::SPORT_RANGE => msg.sport_range = FibRulePortRange::from_bytes(data).ok(),
                fra::DPORT_RANGE => msg.dport_range = FibRulePortRange::from_bytes(data).ok(),
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
    use crate::netlink::types::family::AF_INET;

    #[test]
    fn test_parse_rule() {
        let mut hdr = FibRuleHdr::new().with_family(AF_INET);
        hdr.action = 1;
        hdr.src_len = 24;
        let mut data = hdr.as_bytes().to_vec();
        data.extend(MessageBuilder::attrs(|b| {
            b.append_attr_u32(fra::PRIORITY, 100);
            b.append_attr(fra::SRC, &[192, 168, 1, 0]);
            b.append_attr_str(fra::IIFNAME, "eth0");
            b.append_attr_u32(fra::TABLE, 1000);
            let range = FibRulePortRange { start: 80, end: 90 };
            b.append_attr(fra::DPORT_RANGE, range.as_bytes());
        }));

        let msg = RuleMessage::from_bytes(&data).unwrap();
        assert_eq!(msg.priority, Some(100));
        assert_eq!(msg.source, Some("192.168.1.0".parse().unwrap()));
        assert_eq!(msg.iifname.as_deref(), Some("eth0"));
        assert_eq!(msg.table_id(), 1000);
        let range = msg.dport_range.unwrap();
        assert_eq!((range.start, range.end), (80, 90));
    }
}
