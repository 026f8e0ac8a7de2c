use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Resolver configuration from resolv.conf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsResolver {
    /// Name servers in file order.
    #[serde(default)]
    pub name_servers: Vec<IpAddr>,
    /// Search domains; a `domain` line contributes its single entry.
    #[serde(default)]
    pub searches: Vec<String>,
}
