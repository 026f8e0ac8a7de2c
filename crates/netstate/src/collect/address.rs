//! Address collector (RTM_GETADDR).

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use tracing::debug;

use super::{Collection, dump_warnings};
use crate::error::{Result, SnapshotError};
use crate::netlink::messages::AddressMessage;
use crate::netlink::{Connection, NlMsgType, Protocol};
use crate::state::{Ipv4AddrInfo, Ipv6AddrFlag, Ipv6AddrInfo, WarningSource, format_lifetime};

/// Addresses of one interface, in kernel order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IfaceAddresses {
    pub ipv4: Vec<Ipv4AddrInfo>,
    pub ipv6: Vec<Ipv6AddrInfo>,
}

pub async fn collect(timeout: Duration) -> Result<Collection<HashMap<u32, IfaceAddresses>>> {
    debug!("collecting addresses");
    let conn = Connection::new(Protocol::Route)
        .map_err(|e| SnapshotError::from_netlink("address", &e))?
        .with_timeout(timeout);
    let dump = conn
        .dump_typed::<AddressMessage>(NlMsgType::RTM_GETADDR)
        .await
        .map_err(|e| SnapshotError::from_netlink("address", &e))?;

    let warnings = dump_warnings(WarningSource::Address, &dump);
    let grouped = group_by_ifindex(&dump.records);
    debug!(ifaces = grouped.len(), "addresses collected");
    Ok(Collection::with_warnings(grouped, warnings))
}

/// Group address records by interface index.
pub fn group_by_ifindex(records: &[AddressMessage]) -> HashMap<u32, IfaceAddresses> {
    let mut grouped: HashMap<u32, IfaceAddresses> = HashMap::new();
    for msg in records {
        let Some(address) = msg.primary_address() else {
            continue;
        };
        let (valid_lft, preferred_lft) = lifetimes(msg);
        let entry = grouped.entry(msg.ifindex()).or_default();

        match address {
            IpAddr::V4(address) => entry.ipv4.push(Ipv4AddrInfo {
                address,
                prefix_len: msg.prefix_len(),
                peer: match msg.peer() {
                    Some(IpAddr::V4(peer)) => Some(peer),
                    _ => None,
                },
                valid_lft,
                preferred_lft,
            }),
            IpAddr::V6(address) => entry.ipv6.push(Ipv6AddrInfo {
                address,
                prefix_len: msg.prefix_len(),
                valid_lft,
                preferred_lft,
                flags: Ipv6AddrFlag::from_bits(msg.flags()),
                peer: match msg.peer() {
                    Some(IpAddr::V6(peer)) => Some(peer),
                    _ => None,
                },
            }),
        }
    }
    grouped
}

/// Valid and preferred lifetimes. No cache info means a permanent address.
fn lifetimes(msg: &AddressMessage) -> (String, String) {
    match &msg.cache_info {
        Some(ci) => (format_lifetime(ci.ifa_valid), format_lifetime(ci.ifa_prefered)),
        None => (format_lifetime(u32::MAX), format_lifetime(u32::MAX)),
    }
}
