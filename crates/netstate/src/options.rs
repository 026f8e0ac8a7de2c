//! Snapshot request options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::filter::{RouteFilter, RuleFilter};
use crate::netlink::connection::DEFAULT_TIMEOUT;

/// What to collect and how long to wait for each kernel exchange.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use netstate::RetrieveOptions;
///
/// let opts = RetrieveOptions::new()
///     .with_timeout(Duration::from_secs(2))
///     .ethtool(false);
/// let snapshot = netstate::retrieve(&opts).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    pub(crate) timeout: Duration,
    pub(crate) iface_name: Option<String>,
    pub(crate) addresses: bool,
    pub(crate) bridge_vlans: bool,
    pub(crate) ethtool: bool,
    pub(crate) sriov: bool,
    pub(crate) mptcp: bool,
    pub(crate) dns: bool,
    pub(crate) routes: bool,
    pub(crate) rules: bool,
    pub(crate) route_filter: RouteFilter,
    pub(crate) rule_filter: RuleFilter,
    pub(crate) resolv_conf: PathBuf,
    pub(crate) sysfs_root: PathBuf,
    pub(crate) procfs_root: PathBuf,
    pub(crate) cancel: CancellationToken,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            iface_name: None,
            addresses: true,
            bridge_vlans: true,
            ethtool: true,
            sriov: true,
            mptcp: true,
            dns: true,
            routes: true,
            rules: true,
            route_filter: RouteFilter::default(),
            rule_filter: RuleFilter::default(),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
            sysfs_root: PathBuf::from("/sys"),
            procfs_root: PathBuf::from("/proc"),
            cancel: CancellationToken::new(),
        }
    }
}

impl RetrieveOptions {
    /// Collect everything with the default 5 s bound per exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound on each netlink request/response exchange. Must be non-zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report only this interface. Retrieval fails with
    /// [`SnapshotError::InvalidArgument`](crate::SnapshotError) when it
    /// does not exist.
    pub fn with_iface_name(mut self, name: impl Into<String>) -> Self {
        self.iface_name = Some(name.into());
        self
    }

    pub fn addresses(mut self, enabled: bool) -> Self {
        self.addresses = enabled;
        self
    }

    /// AF_BRIDGE VLAN tables of bridges and bridge ports.
    pub fn bridge_vlans(mut self, enabled: bool) -> Self {
        self.bridge_vlans = enabled;
        self
    }

    pub fn ethtool(mut self, enabled: bool) -> Self {
        self.ethtool = enabled;
        self
    }

    pub fn sriov(mut self, enabled: bool) -> Self {
        self.sriov = enabled;
        self
    }

    pub fn mptcp(mut self, enabled: bool) -> Self {
        self.mptcp = enabled;
        self
    }

    pub fn dns(mut self, enabled: bool) -> Self {
        self.dns = enabled;
        self
    }

    pub fn routes(mut self, enabled: bool) -> Self {
        self.routes = enabled;
        self
    }

    pub fn rules(mut self, enabled: bool) -> Self {
        self.rules = enabled;
        self
    }

    pub fn with_route_filter(mut self, filter: RouteFilter) -> Self {
        self.route_filter = filter;
        self
    }

    pub fn with_rule_filter(mut self, filter: RuleFilter) -> Self {
        self.rule_filter = filter;
        self
    }

    /// Resolver config to parse instead of `/etc/resolv.conf`.
    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    /// Mount point of sysfs, for VF netdev lookups.
    pub fn with_sysfs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.sysfs_root = path.into();
        self
    }

    /// Mount point of procfs, for the MPTCP enabled flag.
    pub fn with_procfs_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.procfs_root = path.into();
        self
    }

    /// Token checked between pipeline stages.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn iface_name(&self) -> Option<&str> {
        self.iface_name.as_deref()
    }

    pub fn route_filter(&self) -> &RouteFilter {
        &self.route_filter
    }

    pub fn rule_filter(&self) -> &RuleFilter {
        &self.rule_filter
    }

    pub fn resolv_conf(&self) -> &Path {
        &self.resolv_conf
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RetrieveOptions::new();
        assert_eq!(opts.timeout(), Duration::from_secs(5));
        assert!(opts.ethtool && opts.sriov && opts.mptcp && opts.dns);
        assert!(opts.addresses && opts.bridge_vlans);
        assert!(opts.iface_name().is_none());
        assert!(opts.route_filter().is_empty() && opts.rule_filter().is_empty());
        assert_eq!(opts.resolv_conf(), Path::new("/etc/resolv.conf"));
        assert!(!opts.cancel_token().is_cancelled());
    }

    #[test]
    fn test_builder() {
        let opts = RetrieveOptions::new()
            .with_timeout(Duration::from_millis(250))
            .ethtool(false)
            .rules(false)
            .with_resolv_conf("/tmp/resolv.conf");
        assert_eq!(opts.timeout(), Duration::from_millis(250));
        assert!(!opts.ethtool);
        assert!(!opts.rules);
        assert!(opts.routes);
        assert_eq!(opts.resolv_conf(), Path::new("/tmp/resolv.conf"));
    }

    #[test]
    fn test_filters() {
        let opts = RetrieveOptions::new()
            .with_iface_name("eth0")
            .bridge_vlans(false)
            .with_route_filter(RouteFilter::new().table(254))
            .with_rule_filter(RuleFilter::new().priority(0));
        assert_eq!(opts.iface_name(), Some("eth0"));
        assert!(!opts.bridge_vlans);
        assert_eq!(opts.route_filter().table, Some(254));
        assert_eq!(opts.rule_filter().priority, Some(0));
    }
}
