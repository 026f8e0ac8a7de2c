//! Route collector (RTM_GETROUTE).
//!
//! Collection keeps the raw messages; interface indexes are turned into
//! names by [`to_route`] once the link dump has joined.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Collection, is_absent, merge_dump};
use crate::error::{Result, SnapshotError};
use crate::netlink::attr::AttrMap;
use crate::netlink::connection::dump_request;
use crate::netlink::messages::RouteMessage;
use crate::netlink::types::family::{AF_INET, AF_INET6};
use crate::netlink::types::route::{RtMsg, USER_HZ, rtax};
use crate::netlink::{Connection, NlMsgType, Protocol};
use crate::state::{
    AddressFamily, MultipathRoute, MultipathRouteFlag, Route, RouteFlag, RoutePreference,
    RouteProtocol, RouteRealm, RouteScope, RouteType, Warning, WarningSource, format_prefix,
};

/// Dump all routing tables, IPv6 first then IPv4, keeping kernel order
/// within each family.
pub async fn collect(timeout: Duration) -> Result<Collection<Vec<RouteMessage>>> {
    debug!("collecting routes");
    let conn = Connection::new(Protocol::Route)
        .map_err(|e| SnapshotError::from_netlink("route", &e))?
        .with_timeout(timeout);

    let mut routes = Vec::new();
    let mut warnings = Vec::new();
    for family in [AF_INET6, AF_INET] {
        let mut builder = dump_request(NlMsgType::RTM_GETROUTE);
        builder.append(&RtMsg::new().with_family(family));
        match conn.dump_parsed::<RouteMessage>(builder).await {
            Ok(dump) => merge_dump(WarningSource::Route, dump, &mut routes, &mut warnings),
            Err(e) if is_absent(&e) => {
                warn!(family, error = %e, "route family unavailable");
                warnings.push(Warning::new(
                    WarningSource::Route,
                    format!("family {family} routes unavailable: {e}"),
                ));
            }
            Err(e) => return Err(SnapshotError::from_netlink("route", &e)),
        }
    }

    debug!(routes = routes.len(), "routes collected");
    Ok(Collection::with_warnings(routes, warnings))
}

/// Name of an interface index, or the index itself when unknown.
pub(crate) fn iface_name(names: &HashMap<u32, String>, index: u32) -> String {
    names
        .get(&index)
        .cloned()
        .unwrap_or_else(|| index.to_string())
}

/// Convert a raw route using the interface name index.
pub fn to_route(msg: &RouteMessage, names: &HashMap<u32, String>) -> Route {
    let hdr = &msg.header;
    let mut route = Route::new(AddressFamily::from(msg.family()), msg.table_id());
    route.tos = hdr.rtm_tos;
    route.protocol = RouteProtocol::from(hdr.rtm_protocol);
    route.scope = RouteScope::from(hdr.rtm_scope);
    route.route_type = RouteType::from(hdr.rtm_type);
    route.flags = RouteFlag::from_bits(hdr.rtm_flags);

    route.dst = msg.destination.map(|a| format_prefix(a, hdr.rtm_dst_len));
    route.src = msg.source.map(|a| format_prefix(a, hdr.rtm_src_len));
    route.prefered_src = msg.prefsrc.map(|a| a.to_string());
    route.gateway = msg.gateway.map(|a| a.to_string());
    route.via = msg.via.map(|a| a.to_string());
    route.oif = msg.oif.map(|idx| iface_name(names, idx));
    route.iif = msg.iif.map(|idx| iface_name(names, idx));
    route.metric = msg.priority;
    route.realm = msg.flow.map(RouteRealm::from);
    route.mark = msg.mark;
    route.uid = msg.uid;
    route.preference = msg.pref.map(RoutePreference::from);

    if let Some(metrics) = msg.metrics.as_deref() {
        let m = AttrMap::new(metrics);
        route.lock = m.u32(rtax::LOCK);
        route.mtu = m.u32(rtax::MTU);
        route.window = m.u32(rtax::WINDOW);
        route.rtt = m.u32(rtax::RTT);
        route.rttvar = m.u32(rtax::RTTVAR);
        route.ssthresh = m.u32(rtax::SSTHRESH);
        route.cwnd = m.u32(rtax::CWND);
        route.advmss = m.u32(rtax::ADVMSS);
        route.reordering = m.u32(rtax::REORDERING);
        route.hoplimit = m.u32(rtax::HOPLIMIT);
        route.initcwnd = m.u32(rtax::INITCWND);
        route.features = m.u32(rtax::FEATURES);
        route.rto_min = m.u32(rtax::RTO_MIN);
        route.initrwnd = m.u32(rtax::INITRWND);
        route.quickack = m.u32(rtax::QUICKACK);
        route.cc_algo = m.string(rtax::CC_ALGO).filter(|s| !s.is_empty());
        route.fastopen_no_cookie = m.u32(rtax::FASTOPEN_NO_COOKIE);
    }

    if let Some(ci) = &msg.cache_info {
        route.cache_clntref = Some(ci.rta_clntref);
        route.cache_last_use = Some(ci.rta_lastuse);
        route.cache_expires = Some((ci.rta_expires / USER_HZ).max(0) as u32);
        route.cache_error = Some(ci.rta_error);
        route.cache_used = Some(ci.rta_used);
        route.cache_id = Some(ci.rta_id);
        route.cache_ts = Some(ci.rta_ts);
        route.cache_ts_age = Some(ci.rta_tsage);
    }

    if !msg.multipath.is_empty() {
        route.multipath = Some(
            msg.multipath
                .iter()
                .map(|hop| MultipathRoute {
                    via: hop
                        .gateway
                        .or(hop.via)
                        .map(|a| a.to_string())
                        .unwrap_or_default(),
                    iface: iface_name(names, hop.ifindex),
                    weight: u16::from(hop.hops) + 1,
                    flags: MultipathRouteFlag::from_bits(hop.flags),
                })
                .collect(),
        );
    }

    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;
    use crate::netlink::messages::NextHopMessage;
    use crate::netlink::types::route::RtaCacheInfo;

    fn names() -> HashMap<u32, String> {
        HashMap::from([(2, "eth0".to_string()), (3, "eth1".to_string())])
    }

    #[test]
    fn test_default_route() {
        let mut msg = RouteMessage::default();
        msg.header.rtm_family = AF_INET;
        msg.header.rtm_table = 254;
        msg.header.rtm_protocol = 4;
        msg.header.rtm_type = 1;
        msg.gateway = Some("192.0.2.1".parse().unwrap());
        msg.oif = Some(2);
        msg.priority = Some(100);

        let route = to_route(&msg, &names());
        assert_eq!(route.address_family, AddressFamily::Ipv4);
        assert_eq!(route.table, 254);
        assert_eq!(route.protocol, RouteProtocol::Static);
        assert_eq!(route.route_type, RouteType::Unicast);
        assert!(route.dst.is_none());
        assert_eq!(route.gateway.as_deref(), Some("192.0.2.1"));
        assert_eq!(route.oif.as_deref(), Some("eth0"));
        assert_eq!(route.metric, Some(100));
    }

    #[test]
    fn test_unknown_oif_renders_index() {
        let mut msg = RouteMessage::default();
        msg.header.rtm_family = AF_INET6;
        msg.header.rtm_dst_len = 64;
        msg.destination = Some("2001:db8::".parse().unwrap());
        msg.oif = Some(42);
        let route = to_route(&msg, &names());
        assert_eq!(route.oif.as_deref(), Some("42"));
        assert_eq!(route.dst.as_deref(), Some("2001:db8::/64"));
    }

    #[test]
    fn test_multipath_order_and_weight() {
        let mut msg = RouteMessage::default();
        msg.header.rtm_family = AF_INET;
        msg.multipath = vec![
            NextHopMessage {
                hops: 0,
                ifindex: 3,
                gateway: Some("198.51.100.1".parse().unwrap()),
                ..Default::default()
            },
            NextHopMessage {
                hops: 9,
                ifindex: 2,
                gateway: Some("192.0.2.1".parse().unwrap()),
                ..Default::default()
            },
        ];
        let hops = to_route(&msg, &names()).multipath.unwrap();
        assert_eq!(hops[0].iface, "eth1");
        assert_eq!(hops[0].weight, 1);
        assert_eq!(hops[1].iface, "eth0");
        assert_eq!(hops[1].via, "192.0.2.1");
        assert_eq!(hops[1].weight, 10);
    }

    #[test]
    fn test_cache_expires_in_seconds() {
        let msg = RouteMessage {
            cache_info: Some(RtaCacheInfo {
                rta_expires: 30000,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(to_route(&msg, &names()).cache_expires, Some(300));
    }

    #[test]
    fn test_metrics_cc_algo_is_name() {
        let msg = RouteMessage {
            metrics: Some(MessageBuilder::attrs(|b| {
                b.append_attr_u32(rtax::MTU, 1400);
                b.append_attr_str(rtax::CC_ALGO, "bbr");
            })),
            ..Default::default()
        };
        let route = to_route(&msg, &names());
        assert_eq!(route.mtu, Some(1400));
        assert_eq!(route.cc_algo.as_deref(), Some("bbr"));

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["cc_algo"], "bbr");
    }
}
