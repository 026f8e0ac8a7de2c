//! Snapshot filters.
//!
//! Routes and rules are matched after conversion, on the same values the
//! snapshot reports. The kernel treats a zero rtm_scope or rtm_protocol in
//! a dump request as a wildcard, so neither can be pushed down reliably.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapshotError};
use crate::state::{NetworkStateSnapshot, Route, RouteProtocol, RouteRule, RouteScope};

/// Route selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFilter {
    pub protocol: Option<RouteProtocol>,
    pub scope: Option<RouteScope>,
    /// Output interface name.
    pub oif: Option<String>,
    pub table: Option<u32>,
}

impl RouteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protocol(mut self, protocol: RouteProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn scope(mut self, scope: RouteScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn oif(mut self, name: impl Into<String>) -> Self {
        self.oif = Some(name.into());
        self
    }

    pub fn table(mut self, table: u32) -> Self {
        self.table = Some(table);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `route` passes every set criterion.
    ///
    /// A multipath route matches `oif` when any of its next hops leaves
    /// through that interface.
    pub fn matches(&self, route: &Route) -> bool {
        if self.protocol.is_some_and(|p| p != route.protocol) {
            return false;
        }
        if self.scope.is_some_and(|s| s != route.scope) {
            return false;
        }
        if self.table.is_some_and(|t| t != route.table) {
            return false;
        }
        match &self.oif {
            Some(oif) => {
                route.oif.as_deref() == Some(oif.as_str())
                    || route
                        .multipath
                        .iter()
                        .flatten()
                        .any(|hop| hop.iface == *oif)
            }
            None => true,
        }
    }
}

/// Routing rule selection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFilter {
    pub table: Option<u32>,
    pub protocol: Option<RouteProtocol>,
    pub priority: Option<u32>,
    /// Input interface name.
    pub iif: Option<String>,
    /// Output interface name.
    pub oif: Option<String>,
}

impl RuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: u32) -> Self {
        self.table = Some(table);
        self
    }

    pub fn protocol(mut self, protocol: RouteProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn iif(mut self, name: impl Into<String>) -> Self {
        self.iif = Some(name.into());
        self
    }

    pub fn oif(mut self, name: impl Into<String>) -> Self {
        self.oif = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `rule` passes every set criterion. A rule lacking the
    /// attribute a criterion names does not match it.
    pub fn matches(&self, rule: &RouteRule) -> bool {
        fn check<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
            want.is_none() || want == have
        }
        check(&self.table, &rule.table)
            && check(&self.protocol, &rule.protocol)
            && check(&self.priority, &rule.priority)
            && check(&self.iif, &rule.iif)
            && check(&self.oif, &rule.oif)
    }
}

/// Keep only the interface called `name`.
///
/// Relationships keep naming interfaces outside the selection; they were
/// resolved against the full dump.
pub fn select_iface(snapshot: &mut NetworkStateSnapshot, name: &str) -> Result<()> {
    let Some(iface) = snapshot.ifaces.remove(name) else {
        return Err(SnapshotError::InvalidArgument(format!(
            "interface {name} not found"
        )));
    };
    snapshot.ifaces.clear();
    snapshot.ifaces.insert(iface.name.clone(), iface);
    Ok(())
}

/// Drop routes and rules the filters reject.
pub fn apply(snapshot: &mut NetworkStateSnapshot, routes: &RouteFilter, rules: &RuleFilter) {
    if !routes.is_empty() {
        snapshot.routes.retain(|route| routes.matches(route));
    }
    if !rules.is_empty() {
        snapshot.rules.retain(|rule| rules.matches(rule));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AddressFamily, Iface, MultipathRoute, RuleAction};

    fn route(table: u32, protocol: RouteProtocol, scope: RouteScope, oif: &str) -> Route {
        Route {
            protocol,
            scope,
            oif: Some(oif.into()),
            ..Route::new(AddressFamily::Ipv4, table)
        }
    }

    fn hop(iface: &str) -> MultipathRoute {
        MultipathRoute {
            via: "192.0.2.1".into(),
            iface: iface.into(),
            weight: 1,
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_route_filter_criteria() {
        let kernel_link = route(254, RouteProtocol::Kernel, RouteScope::Link, "eth0");
        let static_main = route(254, RouteProtocol::Static, RouteScope::Universe, "eth1");
        let local = route(255, RouteProtocol::Kernel, RouteScope::Host, "lo");

        assert!(RouteFilter::new().matches(&local));

        let f = RouteFilter::new().scope(RouteScope::Universe);
        assert!(f.matches(&static_main));
        assert!(!f.matches(&kernel_link));

        let f = RouteFilter::new().protocol(RouteProtocol::Kernel).table(254);
        assert!(f.matches(&kernel_link));
        assert!(!f.matches(&local));
        assert!(!f.matches(&static_main));

        let f = RouteFilter::new().oif("eth1");
        assert!(f.matches(&static_main));
        assert!(!f.matches(&kernel_link));
    }

    #[test]
    fn test_route_filter_multipath_oif() {
        let mut ecmp = Route::new(AddressFamily::Ipv4, 254);
        ecmp.multipath = Some(vec![hop("eth0"), hop("eth1")]);
        assert!(RouteFilter::new().oif("eth1").matches(&ecmp));
        assert!(!RouteFilter::new().oif("eth2").matches(&ecmp));
    }

    #[test]
    fn test_rule_filter_criteria() {
        let mut main = RouteRule::new(RuleAction::Table, AddressFamily::Ipv4);
        main.table = Some(254);
        main.priority = Some(32766);
        let mut from_vrf = RouteRule::new(RuleAction::Table, AddressFamily::Ipv4);
        from_vrf.priority = Some(1000);
        from_vrf.iif = Some("vrf-blue".into());

        assert!(RuleFilter::new().matches(&main));
        assert!(RuleFilter::new().table(254).matches(&main));
        assert!(!RuleFilter::new().table(254).matches(&from_vrf));
        assert!(RuleFilter::new().iif("vrf-blue").matches(&from_vrf));
        assert!(!RuleFilter::new().priority(1000).matches(&main));
    }

    fn snapshot() -> NetworkStateSnapshot {
        let mut snap = NetworkStateSnapshot::default();
        for (index, name) in [(1, "lo"), (2, "eth0")] {
            snap.ifaces.insert(
                name.into(),
                Iface {
                    index,
                    name: name.into(),
                    ..Default::default()
                },
            );
        }
        snap.routes = vec![
            route(254, RouteProtocol::Kernel, RouteScope::Link, "eth0"),
            route(255, RouteProtocol::Kernel, RouteScope::Host, "lo"),
        ];
        snap
    }

    #[test]
    fn test_select_iface() {
        let mut snap = snapshot();
        select_iface(&mut snap, "eth0").unwrap();
        assert_eq!(snap.ifaces.keys().collect::<Vec<_>>(), vec!["eth0"]);
        assert_eq!(snap.routes.len(), 2);

        let err = select_iface(&mut snapshot(), "eth9").unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidArgument(_)));
        assert!(err.to_string().contains("eth9"));
    }

    #[test]
    fn test_apply_filters() {
        let mut snap = snapshot();
        apply(&mut snap, &RouteFilter::new().table(255), &RuleFilter::new());
        assert_eq!(snap.routes.len(), 1);
        assert_eq!(snap.routes[0].oif.as_deref(), Some("lo"));
    }
}
