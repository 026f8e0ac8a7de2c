//! Strongly-typed address message.

use std::net::IpAddr;

use winnow::prelude::*;

use crate::netlink::attr::{NLA_TYPE_MASK, get};
use crate::netlink::parse::{
    FromNetlink, PResult, parse_attrs, parse_header, parse_string_from_bytes,
};
use crate::netlink::types::addr::{IfAddrMsg, IfaCacheinfo, ifa};

/// Address message with all attributes parsed.
#[derive(Debug, Clone, Default)]
pub struct AddressMessage {
    /// Fixed-size header.
    pub header: IfAddrMsg,
    /// IFA_ADDRESS (the peer on point-to-point links).
    pub address: Option<IpAddr>,
    /// IFA_LOCAL.
    pub local: Option<IpAddr>,
    /// IFA_LABEL.
    pub label: Option<String>,
    /// IFA_BROADCAST.
    pub broadcast: Option<IpAddr>,
    /// IFA_CACHEINFO.
    pub cache_info: Option<IfaCacheinfo>,
    /// IFA_FLAGS (full 32-bit flags, supersedes the header byte).
    pub flags: Option<u32>,
}

impl AddressMessage {
    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifa_index
    }

    /// Address family.
    pub fn family(&self) -> u8 {
        self.header.ifa_family
    }

    /// Prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.header.ifa_prefixlen
    }

    /// Effective address flags.
    pub fn flags(&self) -> u32 {
        self.flags.unwrap_or(self.header.ifa_flags as u32)
    }

    /// The interface's own address.
    ///
    /// IPv4 reports it in IFA_LOCAL; IPv6 only sends IFA_ADDRESS.
    pub fn primary_address(&self) -> Option<IpAddr> {
        self.local.or(self.address)
    }

    /// The remote end of a point-to-point address, if distinct.
    pub fn peer(&self) -> Option<IpAddr> {
        match (self.local, self.address) {
            (Some(local), Some(addr)) if local != addr => Some(addr),
            _ => None,
        }
    }
}

impl FromNetlink for AddressMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(IfAddrMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, IfAddrMsg::SIZE)?;
        let header = IfAddrMsg::from_bytes(header_bytes)
            .map_err(|_| winnow::error::ErrMode::Cut(winnow::error::ContextError::new()))?;

        let mut msg = AddressMessage {
            header,
            ..Default::default()
        };

        for (attr_type, data) in parse_attrs(input)? {
            match attr_type & NLA_TYPE_MASK {
                ifa::ADDRESS => msg.address = get::ip_addr(data),
                ifa::LOCAL => msg.local = get::ip_addr(data),
                ifa::LABEL => msg.label = Some(parse_string_from_bytes(data)),
                ifa::BROADCAST => msg.broadcast = get::ip_addr(data),
                ifa::CACHEINFO => msg.cache_info = IfaCacheinfo::from_bytes(data).ok(),
                ifa::FLAGS => msg.flags = get::u32_ne(data).ok(),
                _ => {}
            }
        }

        Ok(msg)
    }
}
