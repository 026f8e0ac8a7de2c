//! MPTCP path manager (generic netlink family `mptcp_pm`).

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Collection, is_absent};
use crate::error::{Result, SnapshotError};
use crate::netlink::attr::{AttrIter, AttrMap, get};
use crate::netlink::genl::{GenlConnection, GenlMsgHdr};
use crate::state::{Mptcp, MptcpAddress, MptcpAddressFlag, Warning, WarningSource};

pub const MPTCP_PM_NAME: &str = "mptcp_pm";
const MPTCP_PM_VER: u8 = 1;

mod cmd {
    pub const GET_ADDR: u8 = 3;
    pub const GET_LIMITS: u8 = 6;
}

pub(crate) mod mptcp_pm_attr {
    pub const ADDR: u16 = 1;
    pub const RCV_ADD_ADDRS: u16 = 2;
    pub const SUBFLOWS: u16 = 3;
}

pub(crate) mod mptcp_pm_addr_attr {
    pub const FAMILY: u16 = 1;
    pub const ID: u16 = 2;
    pub const ADDR4: u16 = 3;
    pub const ADDR6: u16 = 4;
    pub const PORT: u16 = 5;
    pub const FLAGS: u16 = 6;
    pub const IF_IDX: u16 = 7;
}

/// Read the enabled flag and, when enabled, the endpoints and limits.
///
/// Absent when the sysctl is missing or the family is not registered.
/// Endpoint `iface` values are interface indexes until aggregation.
pub async fn collect(procfs_root: &Path, timeout: Duration) -> Result<Option<Collection<Mptcp>>> {
    let Some(enabled) = read_enabled(procfs_root).await? else {
        debug!("MPTCP sysctl missing");
        return Ok(None);
    };
    if !enabled {
        return Ok(Some(Collection::new(Mptcp::default())));
    }

    let conn = GenlConnection::new()
        .map_err(|e| SnapshotError::from_netlink("mptcp", &e))?
        .with_timeout(timeout);
    let family = match conn.get_family(MPTCP_PM_NAME).await {
        Ok(family) => family,
        Err(e) if is_absent(&e) => {
            debug!("mptcp_pm family not registered");
            return Ok(None);
        }
        Err(e) => return Err(SnapshotError::from_netlink("mptcp", &e)),
    };

    let mut mptcp = Mptcp {
        enabled: true,
        ..Default::default()
    };
    let mut warnings = Vec::new();

    match conn
        .dump_command(family.id, cmd::GET_ADDR, MPTCP_PM_VER, |_| {})
        .await
    {
        Ok(replies) => {
            let endpoints = decode_endpoints(&replies);
            warnings.extend(endpoints.warnings);
            mptcp.addresses = Some(endpoints.data);
        }
        Err(e) => {
            warn!(error = %e, "MPTCP endpoint dump failed");
            warnings.push(Warning::new(
                WarningSource::Mptcp,
                format!("endpoint dump failed: {e}"),
            ));
        }
    }

    match conn
        .request(family.id, cmd::GET_LIMITS, MPTCP_PM_VER, |_| {})
        .await
    {
        Ok(replies) => {
            if let Some(payload) = replies.first() {
                let attrs = AttrMap::new(GenlMsgHdr::attrs(payload));
                mptcp.add_addr_accepted_limit = attrs.u32(mptcp_pm_attr::RCV_ADD_ADDRS);
                mptcp.subflows_limit = attrs.u32(mptcp_pm_attr::SUBFLOWS);
            }
        }
        Err(e) => {
            warn!(error = %e, "MPTCP limits query failed");
            warnings.push(Warning::new(
                WarningSource::Mptcp,
                format!("limits query failed: {e}"),
            ));
        }
    }

    debug!(
        endpoints = mptcp.addresses.as_ref().map_or(0, Vec::len),
        "MPTCP collected"
    );
    Ok(Some(Collection::with_warnings(mptcp, warnings)))
}

async fn read_enabled(procfs_root: &Path) -> Result<Option<bool>> {
    let path = procfs_root.join("sys/net/mptcp/enabled");
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Some(content.trim() == "1")),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SnapshotError::from_io("mptcp", &e)),
    }
}

/// Decode GET_ADDR replies. A reply without a usable address is skipped
/// with a warning.
pub(crate) fn decode_endpoints(replies: &[Vec<u8>]) -> Collection<Vec<MptcpAddress>> {
    let mut addresses = Vec::with_capacity(replies.len());
    let mut warnings = Vec::new();
    for (i, payload) in replies.iter().enumerate() {
        match parse_endpoint(GenlMsgHdr::attrs(payload)) {
            Some(addr) => addresses.push(addr),
            None => {
                debug!(reply = i, "skipping MPTCP endpoint");
                warnings.push(Warning::new(
                    WarningSource::Mptcp,
                    format!("skipped endpoint reply {i}: no valid address"),
                ));
            }
        }
    }
    Collection::with_warnings(addresses, warnings)
}

/// Decode one GET_ADDR reply (the attributes after the GENL header).
pub(crate) fn parse_endpoint(attrs: &[u8]) -> Option<MptcpAddress> {
    use mptcp_pm_addr_attr as a;

    let (_, nest) = AttrIter::new(attrs).find(|(kind, _)| *kind == mptcp_pm_attr::ADDR)?;
    let addr = AttrMap::new(nest);

    let address = match (addr.get(a::ADDR4), addr.get(a::ADDR6)) {
        (Some(v4), _) => IpAddr::V4(Ipv4Addr::from(<[u8; 4]>::try_from(v4).ok()?)),
        (None, Some(v6)) => IpAddr::V6(Ipv6Addr::from(<[u8; 16]>::try_from(v6).ok()?)),
        (None, None) => return None,
    };

    Some(MptcpAddress {
        address,
        id: addr.u8(a::ID),
        port: addr.u16(a::PORT).filter(|p| *p != 0),
        flags: addr
            .u32(a::FLAGS)
            .map(MptcpAddressFlag::from_bits)
            .filter(|f| !f.is_empty()),
        iface: addr
            .get(a::IF_IDX)
            .and_then(|d| get::i32_ne(d).ok())
            .filter(|idx| *idx > 0)
            .map(|idx| idx.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use zerocopy::IntoBytes;

    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_parse_endpoint() {
        let attrs = MessageBuilder::attrs(|b| {
            let nest = b.nest_start(mptcp_pm_attr::ADDR);
            b.append_attr_u16(mptcp_pm_addr_attr::FAMILY, 2);
            b.append_attr_u8(mptcp_pm_addr_attr::ID, 1);
            b.append_attr(mptcp_pm_addr_attr::ADDR4, &[192, 0, 2, 10]);
            b.append_attr_u32(mptcp_pm_addr_attr::FLAGS, 1 | 2);
            b.append_attr(mptcp_pm_addr_attr::IF_IDX, &2i32.to_ne_bytes());
            b.nest_end(nest);
        });
        let ep = parse_endpoint(&attrs).unwrap();
        assert_eq!(ep.address, "192.0.2.10".parse::<IpAddr>().unwrap());
        assert_eq!(ep.id, Some(1));
        assert!(ep.port.is_none());
        assert_eq!(
            ep.flags,
            Some(vec![MptcpAddressFlag::Signal, MptcpAddressFlag::Subflow])
        );
        assert_eq!(ep.iface.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_endpoint_without_address() {
        let attrs = MessageBuilder::attrs(|b| {
            let nest = b.nest_start(mptcp_pm_attr::ADDR);
            b.append_attr_u8(mptcp_pm_addr_attr::ID, 3);
            b.nest_end(nest);
        });
        assert!(parse_endpoint(&attrs).is_none());
    }

    #[test]
    fn test_dropped_endpoint_is_reported() {
        let reply = |addr4: &[u8]| {
            let mut payload = GenlMsgHdr::new(cmd::GET_ADDR, MPTCP_PM_VER).as_bytes().to_vec();
            payload.extend(MessageBuilder::attrs(|b| {
                let nest = b.nest_start(mptcp_pm_attr::ADDR);
                b.append_attr_u8(mptcp_pm_addr_attr::ID, 1);
                b.append_attr(mptcp_pm_addr_attr::ADDR4, addr4);
                b.nest_end(nest);
            }));
            payload
        };
        // The second address is truncated.
        let replies = vec![reply(&[192, 0, 2, 10]), reply(&[192, 0])];
        let endpoints = decode_endpoints(&replies);
        assert_eq!(endpoints.data.len(), 1);
        assert_eq!(endpoints.warnings.len(), 1);
        assert_eq!(endpoints.warnings[0].source, WarningSource::Mptcp);
        assert!(endpoints.warnings[0].message.contains("reply 1"));
    }

    #[tokio::test]
    async fn test_missing_sysctl_is_absent() {
        let result = collect(Path::new("/nonexistent/netstate/proc"), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
