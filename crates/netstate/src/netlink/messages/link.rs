//! Strongly-typed link message.

use winnow::prelude::*;

use crate::netlink::attr::{AttrIter, NLA_TYPE_MASK, get};
use crate::netlink::parse::{
    FromNetlink, PResult, parse_attrs, parse_header, parse_string_from_bytes,
};
use crate::netlink::types::link::{IfInfoMsg, ifla, ifla_info};

/// Link message with the attributes the snapshot needs.
///
/// Kind-specific data (`IFLA_INFO_DATA`, `IFLA_INFO_SLAVE_DATA`), the
/// per-family `IFLA_AF_SPEC` block and the VF list stay as raw attribute
/// streams; the classifier and the resolver decode them.
#[derive(Debug, Clone, Default)]
pub struct LinkMessage {
    /// Fixed-size header.
    pub header: IfInfoMsg,
    /// Interface name (IFLA_IFNAME).
    pub name: Option<String>,
    /// Hardware address (IFLA_ADDRESS).
    pub address: Option<Vec<u8>>,
    /// Permanent hardware address (IFLA_PERM_ADDRESS).
    pub perm_address: Option<Vec<u8>>,
    /// MTU (IFLA_MTU).
    pub mtu: Option<u32>,
    pub min_mtu: Option<u32>,
    pub max_mtu: Option<u32>,
    /// Lower device index (IFLA_LINK).
    pub link: Option<u32>,
    /// Controller index (IFLA_MASTER).
    pub master: Option<u32>,
    /// Operational state (IFLA_OPERSTATE).
    pub operstate: Option<u8>,
    /// Peer namespace id (IFLA_LINK_NETNSID).
    pub link_netnsid: Option<i32>,
    /// IFLA_INFO_KIND.
    pub kind: Option<String>,
    /// IFLA_INFO_DATA, raw.
    pub info_data: Option<Vec<u8>>,
    /// IFLA_INFO_SLAVE_KIND.
    pub subordinate_kind: Option<String>,
    /// IFLA_INFO_SLAVE_DATA, raw.
    pub subordinate_data: Option<Vec<u8>>,
    /// IFLA_AF_SPEC, raw.
    pub af_spec: Option<Vec<u8>>,
    /// IFLA_NUM_VF.
    pub num_vf: Option<u32>,
    /// IFLA_VFINFO_LIST, raw.
    pub vfinfo_list: Option<Vec<u8>>,
}

impl LinkMessage {
    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifi_index as u32
    }

    /// Device flags (IFF_*).
    pub fn flags(&self) -> u32 {
        self.header.ifi_flags
    }

    /// Interface name, or empty if the kernel omitted it.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn parse_link_info(&mut self, data: &[u8]) {
        for (kind, payload) in AttrIter::new(data) {
            match kind {
                ifla_info::KIND => self.kind = Some(parse_string_from_bytes(payload)),
                ifla_info::DATA => self.info_data = Some(payload.to_vec()),
                ifla_info::SLAVE_KIND => {
                    self.subordinate_kind = Some(parse_string_from_bytes(payload))
                }
                ifla_info::SLAVE_DATA => self.subordinate_data = Some(payload.to_vec()),
                _ => {}
            }
        }
    }
}

impl FromNetlink for LinkMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(IfInfoMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, IfInfoMsg::SIZE)?;
        let header = IfInfoMsg::from_bytes(header_bytes)
            .map_err(|_| winnow::error::ErrMode::Cut(winnow::error::ContextError::new()))?;

        let mut msg = LinkMessage {
            header,
            ..Default::default()
        };

        for (attr_type, data) in parse_attrs(input)? {
            match attr_type & NLA_TYPE_MASK {
                ifla::IFNAME => msg.name = Some(parse_string_from_bytes(data)),
                ifla::ADDRESS => msg.address = Some(data.to_vec()),
                ifla::PERM_ADDRESS => msg.perm_address = Some(data.to_vec()),
                ifla::MTU => msg.mtu = get::u32_ne(data).ok(),
                ifla::MIN_MTU => msg.min_mtu = get::u32_ne(data).ok(),
                ifla::MAX_MTU => msg.max_mtu = get::u32_ne(data).ok(),
                ifla::LINK => msg.link = get::u32_ne(data).ok(),
                ifla::MASTER => msg.master = get::u32_ne(data).ok(),
                ifla::OPERSTATE => msg.operstate = get::u8(data).ok(),
                ifla::LINK_NETNSID => msg.link_netnsid = get::i32_ne(data).ok(),
                ifla::LINKINFO => msg.parse_link_info(data),
                ifla::AF_SPEC => msg.af_spec = Some(data.to_vec()),
                ifla::NUM_VF => msg.num_vf = get::u32_ne(data).ok(),
                ifla::VFINFO_LIST => msg.vfinfo_list = Some(data.to_vec()),
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

    fn link_payload(index: i32, build: impl FnOnce(&mut MessageBuilder)) -> Vec<u8> {
        let mut hdr = IfInfoMsg::new();
        hdr.ifi_index = index;
        let mut buf = hdr.as_bytes().to_vec();
        buf.extend(MessageBuilder::attrs(build));
        buf
    }

    #[test]
    fn test_parse_loopback() {
        let data = link_payload(1, |b| {
            b.append_attr_str(ifla::IFNAME, "lo");
            b.append_attr_u32(ifla::MTU, 65536);
            b.append_attr_u8(ifla::OPERSTATE, 0);
        });

        let msg = LinkMessage::from_bytes(&data).unwrap();
        assert_eq!(msg.ifindex(), 1);
        assert_eq!(msg.name.as_deref(), Some("lo"));
        assert_eq!(msg.mtu, Some(65536));
        assert_eq!(msg.operstate, Some(0));
        assert!(msg.kind.is_none());
    }

    #[test]
    fn test_parse_link_info_nest() {
        let data = link_payload(5, |b| {
            b.append_attr_str(ifla::IFNAME, "eth0");
            b.append_attr_u32(ifla::MASTER, 4);
            let info = b.nest_start(ifla::LINKINFO);
            b.append_attr_str(ifla_info::KIND, "veth");
            b.append_attr_str(ifla_info::SLAVE_KIND, "bond");
            let sub = b.nest_start(ifla_info::SLAVE_DATA);
            b.append_attr_u8(1, 0);
            b.nest_end(sub);
            b.nest_end(info);
        });

        let msg = LinkMessage::from_bytes(&data).unwrap();
        assert_eq!(msg.master, Some(4));
        assert_eq!(msg.kind.as_deref(), Some("veth"));
        assert_eq!(msg.subordinate_kind.as_deref(), Some("bond"));
        assert_eq!(msg.subordinate_data.map(|d| d.len()), Some(8));
    }

    #[test]
    fn test_parse_truncated_header() {
        assert!(LinkMessage::from_bytes(&[0u8; 8]).is_err());
    }
}
