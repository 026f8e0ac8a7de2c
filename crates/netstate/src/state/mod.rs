//! Snapshot data model.
//!
//! These types are the JSON contract of a snapshot. Optional fields are
//! omitted from the output when absent, which means "not applicable or not
//! supported by the running kernel".

mod bond;
mod bridge;
mod dns;
mod ethtool;
mod iface;
mod ip;
mod mptcp;
mod route;
mod rule;
mod sriov;
mod virt;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use bond::*;
pub use bridge::*;
pub use dns::*;
pub use ethtool::*;
pub use iface::*;
pub use ip::*;
pub use mptcp::*;
pub use route::*;
pub use rule::*;
pub use sriov::*;
pub use virt::*;

/// One consistent view of the host's network state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStateSnapshot {
    /// Interfaces keyed by name.
    #[serde(default)]
    pub ifaces: BTreeMap<String, Iface>,
    /// Routes in the order the kernel reported them.
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Policy routing rules in kernel (priority) order.
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dns_resolver: Option<DnsResolver>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mptcp: Option<Mptcp>,
    /// Records that were dropped or degraded while building the snapshot.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<Warning>,
}

/// The stage that emitted a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSource {
    Link,
    Classify,
    Address,
    Route,
    Rule,
    Ethtool,
    Sriov,
    Mptcp,
    Dns,
}

impl std::fmt::Display for WarningSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Link => "link",
            Self::Classify => "classify",
            Self::Address => "address",
            Self::Route => "route",
            Self::Rule => "rule",
            Self::Ethtool => "ethtool",
            Self::Sriov => "sriov",
            Self::Mptcp => "mptcp",
            Self::Dns => "dns",
        };
        f.write_str(s)
    }
}

/// A per-record or per-collector problem that did not abort the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub source: WarningSource,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iface: Option<String>,
    pub message: String,
}

impl Warning {
    /// A warning not tied to one interface.
    pub fn new(source: WarningSource, message: impl Into<String>) -> Self {
        Self {
            source,
            iface: None,
            message: message.into(),
        }
    }

    /// A warning about one interface.
    pub fn for_iface(
        source: WarningSource,
        iface: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            iface: Some(iface.into()),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.iface {
            Some(iface) => write!(f, "{} [{}]: {}", self.source, iface, self.message),
            None => write!(f, "{}: {}", self.source, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_json() {
        let json = serde_json::to_value(NetworkStateSnapshot::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"ifaces": {}, "routes": [], "rules": []})
        );
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::for_iface(WarningSource::Ethtool, "eth0", "rings: timed out");
        assert_eq!(w.to_string(), "ethtool [eth0]: rings: timed out");
        let w = Warning::new(WarningSource::Dns, "bad nameserver");
        assert_eq!(w.to_string(), "dns: bad nameserver");
    }

    #[test]
    fn test_missing_sections_deserialize() {
        let snap: NetworkStateSnapshot = serde_json::from_str(r#"{"ifaces":{}}"#).unwrap();
        assert!(snap.routes.is_empty());
        assert!(snap.mptcp.is_none());
        assert!(snap.warnings.is_empty());
    }
}
