//! Policy routing rule collector (RTM_GETRULE).

use std::time::Duration;

use tracing::{debug, warn};

use super::{Collection, is_absent, merge_dump};
use crate::error::{Result, SnapshotError};
use crate::netlink::connection::dump_request;
use crate::netlink::messages::RuleMessage;
use crate::netlink::types::family::{AF_INET, AF_INET6};
use crate::netlink::types::rule::{FibRuleHdr, FibRulePortRange};
use crate::netlink::{Connection, NlMsgType, Protocol};
use crate::state::{
    AddressFamily, IpProtocol, RouteProtocol, RouteRealm, RouteRule, RuleAction, Warning,
    WarningSource, format_prefix,
};

/// Dump rules for IPv6 then IPv4. The kernel returns each family in
/// priority order, which is kept.
pub async fn collect(timeout: Duration) -> Result<Collection<Vec<RouteRule>>> {
    debug!("collecting rules");
    let conn = Connection::new(Protocol::Route)
        .map_err(|e| SnapshotError::from_netlink("rule", &e))?
        .with_timeout(timeout);

    let mut raw = Vec::new();
    let mut warnings = Vec::new();
    for family in [AF_INET6, AF_INET] {
        let mut builder = dump_request(NlMsgType::RTM_GETRULE);
        builder.append(&FibRuleHdr::new().with_family(family));
        match conn.dump_parsed::<RuleMessage>(builder).await {
            Ok(dump) => merge_dump(WarningSource::Rule, dump, &mut raw, &mut warnings),
            Err(e) if is_absent(&e) => {
                warn!(family, error = %e, "rule family unavailable");
                warnings.push(Warning::new(
                    WarningSource::Rule,
                    format!("family {family} rules unavailable: {e}"),
                ));
            }
            Err(e) => return Err(SnapshotError::from_netlink("rule", &e)),
        }
    }

    let rules: Vec<RouteRule> = raw.iter().map(to_rule).collect();
    debug!(rules = rules.len(), "rules collected");
    Ok(Collection::with_warnings(rules, warnings))
}

fn port_range(range: &FibRulePortRange) -> String {
    format!("{}-{}", range.start, range.end)
}

/// `u32::MAX` is the kernel's "not set" for the suppress selectors.
fn unset_if_max(v: Option<u32>) -> Option<u32> {
    v.filter(|v| *v != u32::MAX)
}

pub fn to_rule(msg: &RuleMessage) -> RouteRule {
    let hdr = &msg.header;
    let mut rule = RouteRule::new(
        RuleAction::from(hdr.action),
        AddressFamily::from(msg.family()),
    );
    rule.flags = hdr.flags;
    rule.tos = hdr.tos;
    rule.table = Some(msg.table_id()).filter(|t| *t != 0);
    rule.dst = msg.destination.map(|a| format_prefix(a, hdr.dst_len));
    rule.src = msg.source.map(|a| format_prefix(a, hdr.src_len));
    rule.iif = msg.iifname.clone();
    rule.oif = msg.oifname.clone();
    rule.goto = msg.goto;
    rule.priority = msg.priority;
    rule.fw_mark = msg.fwmark;
    rule.fw_mask = msg.fwmask;
    rule.realm = msg.flow.map(RouteRealm::from);
    rule.tun_id = msg.tun_id;
    rule.suppress_ifgroup = unset_if_max(msg.suppress_ifgroup);
    rule.suppress_prefix_len = unset_if_max(msg.suppress_prefixlen);
    rule.protocol = msg.protocol.map(RouteProtocol::from);
    rule.ip_proto = msg.ip_proto.map(IpProtocol::from);
    rule.src_port_range = msg.sport_range.as_ref().map(port_range);
    rule.dst_port_range = msg.dport_range.as_ref().map(port_range);
    rule.l3mdev = msg.l3mdev.map(|v| v != 0);
    rule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(priority: u32, table: u8) -> RuleMessage {
        let mut msg = RuleMessage::default();
        msg.header.family = AF_INET;
        msg.header.action = 1;
        msg.header.table = table;
        msg.priority = Some(priority);
        msg
    }

    #[test]
    fn test_suppress_max_is_unset() {
        let mut msg = rule(32766, 254);
        msg.suppress_prefixlen = Some(u32::MAX);
        msg.suppress_ifgroup = Some(u32::MAX);
        let r = to_rule(&msg);
        assert_eq!(r.action, RuleAction::Table);
        assert_eq!(r.table, Some(254));
        assert!(r.suppress_prefix_len.is_none());
        assert!(r.suppress_ifgroup.is_none());

        msg.suppress_prefixlen = Some(0);
        assert_eq!(to_rule(&msg).suppress_prefix_len, Some(0));
    }

    #[test]
    fn test_port_ranges_and_selectors() {
        let mut msg = rule(100, 0);
        msg.table = Some(1000);
        msg.header.src_len = 24;
        msg.source = Some("192.0.2.0".parse().unwrap());
        msg.ip_proto = Some(6);
        msg.dport_range = Some(FibRulePortRange { start: 80, end: 443 });
        msg.iifname = Some("eth0".into());
        let r = to_rule(&msg);
        assert_eq!(r.table, Some(1000));
        assert_eq!(r.src.as_deref(), Some("192.0.2.0/24"));
        assert_eq!(r.ip_proto, Some(IpProtocol::Tcp));
        assert_eq!(r.dst_port_range.as_deref(), Some("80-443"));
        assert!(r.src_port_range.is_none());
        assert_eq!(r.iif.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_order_preserved() {
        let msgs = [rule(0, 255), rule(32766, 254), rule(32767, 253)];
        let prios: Vec<_> = msgs.iter().map(to_rule).filter_map(|r| r.priority).collect();
        assert_eq!(prios, vec![0, 32766, 32767]);
    }
}
