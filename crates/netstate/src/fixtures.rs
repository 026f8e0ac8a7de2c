//! Builders for synthetic kernel messages used by unit tests.

use crate::netlink::messages::LinkMessage;
use crate::netlink::types::link::{IfInfoMsg, ifla, ifla_info};
use crate::netlink::{FromNetlink, MessageBuilder};

pub(crate) use crate::classify::bond::{ifla_bond, ifla_bond_slave};
pub(crate) use crate::classify::bridge::{ifla_br, ifla_brport};

/// Builds a [`LinkMessage`] by encoding it the way the kernel would and
/// running it through the real parser.
pub(crate) struct LinkFixture {
    header: IfInfoMsg,
    name: String,
    mtu: Option<u32>,
    address: Option<Vec<u8>>,
    link: Option<u32>,
    master: Option<u32>,
    operstate: Option<u8>,
    netnsid: Option<i32>,
    kind: Option<(String, Vec<u8>)>,
    subordinate: Option<(String, Vec<u8>)>,
    af_spec: Option<Vec<u8>>,
    vfinfo: Option<Vec<u8>>,
}

impl LinkFixture {
    pub(crate) fn new(index: u32, name: &str) -> Self {
        let mut header = IfInfoMsg::new();
        header.ifi_index = index as i32;
        Self {
            header,
            name: name.to_string(),
            mtu: None,
            address: None,
            link: None,
            master: None,
            operstate: None,
            netnsid: None,
            kind: None,
            subordinate: None,
            af_spec: None,
            vfinfo: None,
        }
    }

    pub(crate) fn kind(mut self, kind: &str, data: impl FnOnce(&mut MessageBuilder)) -> Self {
        self.kind = Some((kind.to_string(), MessageBuilder::attrs(data)));
        self
    }

    pub(crate) fn subordinate(
        mut self,
        kind: &str,
        data: impl FnOnce(&mut MessageBuilder),
    ) -> Self {
        self.subordinate = Some((kind.to_string(), MessageBuilder::attrs(data)));
        self
    }

    pub(crate) fn link(mut self, index: u32) -> Self {
        self.link = Some(index);
        self
    }

    pub(crate) fn master(mut self, index: u32) -> Self {
        self.master = Some(index);
        self
    }

    pub(crate) fn netnsid(mut self, id: i32) -> Self {
        self.netnsid = Some(id);
        self
    }

    pub(crate) fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    pub(crate) fn flags(mut self, flags: u32) -> Self {
        self.header.ifi_flags = flags;
        self
    }

    pub(crate) fn address(mut self, mac: &[u8]) -> Self {
        self.address = Some(mac.to_vec());
        self
    }

    pub(crate) fn operstate(mut self, state: u8) -> Self {
        self.operstate = Some(state);
        self
    }

    pub(crate) fn af_spec(mut self, data: impl FnOnce(&mut MessageBuilder)) -> Self {
        self.af_spec = Some(MessageBuilder::attrs(data));
        self
    }

    pub(crate) fn vfinfo(mut self, data: impl FnOnce(&mut MessageBuilder)) -> Self {
        self.vfinfo = Some(MessageBuilder::attrs(data));
        self
    }

    pub(crate) fn build(self) -> LinkMessage {
        let mut buf = self.header.as_bytes().to_vec();
        buf.extend(MessageBuilder::attrs(|b| {
            b.append_attr_str(ifla::IFNAME, &self.name);
            if let Some(mtu) = self.mtu {
                b.append_attr_u32(ifla::MTU, mtu);
            }
            if let Some(addr) = &self.address {
                b.append_attr(ifla::ADDRESS, addr);
            }
            if let Some(link) = self.link {
                b.append_attr_u32(ifla::LINK, link);
            }
            if let Some(master) = self.master {
                b.append_attr_u32(ifla::MASTER, master);
            }
            if let Some(state) = self.operstate {
                b.append_attr_u8(ifla::OPERSTATE, state);
            }
            if let Some(id) = self.netnsid {
                b.append_attr(ifla::LINK_NETNSID, &id.to_ne_bytes());
            }
            if self.kind.is_some() || self.subordinate.is_some() {
                let info = b.nest_start(ifla::LINKINFO);
                if let Some((kind, data)) = &self.kind {
                    b.append_attr_str(ifla_info::KIND, kind);
                    b.append_attr(ifla_info::DATA, data);
                }
                if let Some((kind, data)) = &self.subordinate {
                    b.append_attr_str(ifla_info::SLAVE_KIND, kind);
                    b.append_attr(ifla_info::SLAVE_DATA, data);
                }
                b.nest_end(info);
            }
            if let Some(af_spec) = &self.af_spec {
                b.append_attr(ifla::AF_SPEC, af_spec);
            }
            if let Some(vfinfo) = &self.vfinfo {
                b.append_attr(ifla::VFINFO_LIST, vfinfo);
            }
        }));
        LinkMessage::from_bytes(&buf).expect("fixture encodes a valid link message")
    }
}
