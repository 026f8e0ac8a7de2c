//! Link collector (RTM_GETLINK).

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Collection, dump_warnings};
use crate::classify::bridge::decode_vlans;
use crate::error::{Result, SnapshotError};
use crate::netlink::connection::{do_request, dump_request};
use crate::netlink::messages::LinkMessage;
use crate::netlink::types::family::{AF_BRIDGE, AF_UNSPEC};
use crate::netlink::types::link::{IfInfoMsg, ifla, rtext_filter};
use crate::netlink::{Connection, NlMsgType, Protocol};
use crate::state::{BridgeVlanEntry, Warning, WarningSource};

/// Raw links plus the VLAN entries of bridges and bridge ports.
#[derive(Debug, Clone, Default)]
pub struct LinkDump {
    /// Links in kernel order.
    pub links: Vec<LinkMessage>,
    /// AF_BRIDGE VLAN entries by ifindex.
    pub bridge_vlans: HashMap<u32, Vec<BridgeVlanEntry>>,
}

fn link_request(family: u8, ext_mask: u32) -> crate::netlink::MessageBuilder {
    let mut builder = dump_request(NlMsgType::RTM_GETLINK);
    builder.append(&IfInfoMsg::new().with_family(family));
    builder.append_attr_u32(ifla::EXT_MASK, ext_mask);
    builder
}

/// Dump every link. This collector is mandatory: any transport failure
/// aborts the snapshot. The AF_BRIDGE dump is skipped unless
/// `bridge_vlans` is set.
pub async fn collect(timeout: Duration, bridge_vlans: bool) -> Result<Collection<LinkDump>> {
    debug!("collecting links");
    let conn = Connection::new(Protocol::Route)
        .map_err(|e| SnapshotError::from_netlink("link", &e))?
        .with_timeout(timeout);

    let dump = conn
        .dump_parsed::<LinkMessage>(link_request(
            AF_UNSPEC,
            rtext_filter::VF | rtext_filter::BRVLAN,
        ))
        .await
        .map_err(|e| SnapshotError::from_netlink("link", &e))?;
    let mut warnings = dump_warnings(WarningSource::Link, &dump);
    let links = dump.records;

    if !bridge_vlans {
        debug!(links = links.len(), "links collected");
        return Ok(Collection::with_warnings(
            LinkDump {
                links,
                bridge_vlans: HashMap::new(),
            },
            warnings,
        ));
    }

    let bridge_vlans = match conn
        .dump_parsed::<LinkMessage>(link_request(AF_BRIDGE, rtext_filter::BRVLAN_COMPRESSED))
        .await
    {
        Ok(dump) => {
            warnings.extend(dump_warnings(WarningSource::Link, &dump));
            bridge_vlan_map(&dump.records)
        }
        Err(e) => {
            warn!(error = %e, "bridge VLAN dump failed");
            warnings.push(Warning::new(
                WarningSource::Link,
                format!("bridge VLAN dump failed: {e}"),
            ));
            HashMap::new()
        }
    };

    debug!(
        links = links.len(),
        bridge_vlans = bridge_vlans.len(),
        "links collected"
    );
    Ok(Collection::with_warnings(
        LinkDump {
            links,
            bridge_vlans,
        },
        warnings,
    ))
}

fn lookup_request(name: &str) -> crate::netlink::MessageBuilder {
    let mut builder = do_request(NlMsgType::RTM_GETLINK);
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(ifla::IFNAME, name);
    builder
}

/// Ask the kernel for the link called `name`. A missing link is an
/// invalid argument.
pub async fn lookup(name: &str, timeout: Duration) -> Result<LinkMessage> {
    let conn = Connection::new(Protocol::Route)
        .map_err(|e| SnapshotError::from_netlink("link", &e))?
        .with_timeout(timeout);
    match conn.request_parsed::<LinkMessage>(lookup_request(name)).await {
        Ok(link) => Ok(link),
        Err(e) if e.is_not_found() => Err(SnapshotError::InvalidArgument(format!(
            "interface {name} not found"
        ))),
        Err(e) => Err(SnapshotError::from_netlink("link", &e)),
    }
}

/// VLAN entries of each AF_BRIDGE link that reported any.
pub fn bridge_vlan_map(links: &[LinkMessage]) -> HashMap<u32, Vec<BridgeVlanEntry>> {
    links
        .iter()
        .filter_map(|link| {
            let entries = decode_vlans(link.af_spec.as_deref()?);
            (!entries.is_empty()).then(|| (link.ifindex(), entries))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LinkFixture;
    use crate::netlink::types::link::ifla_bridge;

    #[test]
    fn test_bridge_vlan_map_skips_empty() {
        let mut info = Vec::new();
        info.extend_from_slice(&0u16.to_ne_bytes());
        info.extend_from_slice(&100u16.to_ne_bytes());

        let links = [
            LinkFixture::new(5, "eth2")
                .af_spec(|b| b.append_attr(ifla_bridge::VLAN_INFO, &info))
                .build(),
            LinkFixture::new(6, "br0").af_spec(|_| {}).build(),
            LinkFixture::new(7, "eth3").build(),
        ];
        let map = bridge_vlan_map(&links);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&5][0].vid, Some(100));
    }

    #[test]
    fn test_lookup_request_names_link() {
        use crate::netlink::attr::AttrMap;
        use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NlMsgHdr};

        let msg = lookup_request("eth0").finish();
        let hdr = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_ne!(hdr.nlmsg_flags & NLM_F_ACK, 0);
        assert_eq!(hdr.nlmsg_flags & NLM_F_DUMP, 0);

        let attrs = &msg[crate::netlink::NLMSG_HDRLEN + std::mem::size_of::<IfInfoMsg>()..];
        assert_eq!(AttrMap::new(attrs).string(ifla::IFNAME).as_deref(), Some("eth0"));
    }
}
