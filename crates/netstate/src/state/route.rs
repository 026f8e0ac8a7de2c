use serde::{Deserialize, Serialize};

use super::AddressFamily;
use crate::netlink::types::route::route_flags;

/// One kernel route.
///
/// `oif`, `iif` and multipath `iface` are weak references: interface names
/// when the index is known, otherwise the decimal index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub address_family: AddressFamily,
    pub tos: u8,
    pub table: u32,
    pub protocol: RouteProtocol,
    pub scope: RouteScope,
    pub route_type: RouteType,
    #[serde(default)]
    pub flags: Vec<RouteFlag>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub oif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iif: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prefered_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub realm: Option<RouteRealm>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mark: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<u32>,

    // RTAX_* from RTA_METRICS
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rtt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rttvar: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ssthresh: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cwnd: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub advmss: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reordering: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hoplimit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initcwnd: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub features: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rto_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initrwnd: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quickack: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    /// Congestion control algorithm name (RTAX_CC_ALGO).
    pub cc_algo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fastopen_no_cookie: Option<u32>,

    // RTA_CACHEINFO
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_clntref: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_last_use: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_expires: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_error: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_ts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cache_ts_age: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metric: Option<u32>,
    /// IPv6 router preference. The key keeps the established schema spelling.
    #[serde(
        rename = "perference",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub preference: Option<RoutePreference>,
    /// Next hops in kernel order.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub multipath: Option<Vec<MultipathRoute>>,
}

impl Route {
    /// A route with only the header fields set.
    pub fn new(address_family: AddressFamily, table: u32) -> Self {
        Self {
            address_family,
            tos: 0,
            table,
            protocol: RouteProtocol::Unspec,
            scope: RouteScope::Universe,
            route_type: RouteType::Unspec,
            flags: Vec::new(),
            dst: None,
            oif: None,
            iif: None,
            prefered_src: None,
            src: None,
            realm: None,
            gateway: None,
            via: None,
            mark: None,
            uid: None,
            lock: None,
            mtu: None,
            window: None,
            rtt: None,
            rttvar: None,
            ssthresh: None,
            cwnd: None,
            advmss: None,
            reordering: None,
            hoplimit: None,
            initcwnd: None,
            features: None,
            rto_min: None,
            initrwnd: None,
            quickack: None,
            cc_algo: None,
            fastopen_no_cookie: None,
            cache_clntref: None,
            cache_last_use: None,
            cache_expires: None,
            cache_error: None,
            cache_used: None,
            cache_id: None,
            cache_ts: None,
            cache_ts_age: None,
            metric: None,
            preference: None,
            multipath: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipathRoute {
    /// Gateway address of this hop.
    pub via: String,
    pub iface: String,
    /// `rtnh_hops + 1`.
    pub weight: u16,
    #[serde(default)]
    pub flags: Vec<MultipathRouteFlag>,
}

/// RTA_FLOW realm pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRealm {
    pub source: u16,
    pub destination: u16,
}

impl From<u32> for RouteRealm {
    fn from(v: u32) -> Self {
        Self {
            source: (v >> 16) as u16,
            destination: (v & 0xffff) as u16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteProtocol {
    Unspec,
    #[serde(rename = "icmp_redirect")]
    Redirect,
    Kernel,
    Boot,
    Static,
    Gated,
    Ra,
    #[serde(rename = "merit_mrt")]
    Mrt,
    Zebra,
    Bird,
    #[serde(rename = "decnet_routing_daemon")]
    DnRouted,
    Xorp,
    #[serde(rename = "netsukuku")]
    Ntk,
    Dhcp,
    #[serde(rename = "multicast_daemon")]
    Mrouted,
    #[serde(rename = "keepalived_daemon")]
    Keepalived,
    Babel,
    Bgp,
    Isis,
    Ospf,
    Rip,
    Eigrp,
    Other(u8),
}

impl From<u8> for RouteProtocol {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unspec,
            1 => Self::Redirect,
            2 => Self::Kernel,
            3 => Self::Boot,
            4 => Self::Static,
            8 => Self::Gated,
            9 => Self::Ra,
            10 => Self::Mrt,
            11 => Self::Zebra,
            12 => Self::Bird,
            13 => Self::DnRouted,
            14 => Self::Xorp,
            15 => Self::Ntk,
            16 => Self::Dhcp,
            17 => Self::Mrouted,
            18 => Self::Keepalived,
            42 => Self::Babel,
            186 => Self::Bgp,
            187 => Self::Isis,
            188 => Self::Ospf,
            189 => Self::Rip,
            192 => Self::Eigrp,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteScope {
    Universe,
    Site,
    Link,
    Host,
    NoWhere,
    Other(u8),
}

impl From<u8> for RouteScope {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Universe,
            200 => Self::Site,
            253 => Self::Link,
            254 => Self::Host,
            255 => Self::NoWhere,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Unspec,
    Unicast,
    Local,
    Broadcast,
    Anycast,
    Multicast,
    BlackHole,
    Unreachable,
    Prohibit,
    Throw,
    Nat,
    ExternalResolve,
    Other(u8),
}

impl From<u8> for RouteType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Unspec,
            1 => Self::Unicast,
            2 => Self::Local,
            3 => Self::Broadcast,
            4 => Self::Anycast,
            5 => Self::Multicast,
            6 => Self::BlackHole,
            7 => Self::Unreachable,
            8 => Self::Prohibit,
            9 => Self::Throw,
            10 => Self::Nat,
            11 => Self::ExternalResolve,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePreference {
    Low,
    Medium,
    High,
    Other(u8),
}

impl From<u8> for RoutePreference {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Medium,
            1 => Self::High,
            3 => Self::Low,
            v => Self::Other(v),
        }
    }
}

/// RTM_F_* and RTNH_F_* flags on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteFlag {
    Dead,
    Pervasive,
    OnLink,
    Offload,
    LinkDown,
    Unresolved,
    Trap,
    Notify,
    Cloned,
    Equalize,
    Prefix,
    LookupTable,
    FibMatch,
    RtOffload,
    RtTrap,
    Other(u32),
}

const ROUTE_FLAG_NAMES: &[(u32, RouteFlag)] = &[
    (route_flags::RTNH_F_DEAD, RouteFlag::Dead),
    (route_flags::RTNH_F_PERVASIVE, RouteFlag::Pervasive),
    (route_flags::RTNH_F_ONLINK, RouteFlag::OnLink),
    (route_flags::RTNH_F_OFFLOAD, RouteFlag::Offload),
    (route_flags::RTNH_F_LINKDOWN, RouteFlag::LinkDown),
    (route_flags::RTNH_F_UNRESOLVED, RouteFlag::Unresolved),
    (route_flags::RTNH_F_TRAP, RouteFlag::Trap),
    (route_flags::RTM_F_NOTIFY, RouteFlag::Notify),
    (route_flags::RTM_F_CLONED, RouteFlag::Cloned),
    (route_flags::RTM_F_EQUALIZE, RouteFlag::Equalize),
    (route_flags::RTM_F_PREFIX, RouteFlag::Prefix),
    (route_flags::RTM_F_LOOKUP_TABLE, RouteFlag::LookupTable),
    (route_flags::RTM_F_FIB_MATCH, RouteFlag::FibMatch),
    (route_flags::RTM_F_OFFLOAD, RouteFlag::RtOffload),
    (route_flags::RTM_F_TRAP, RouteFlag::RtTrap),
];

impl RouteFlag {
    pub fn from_bits(bits: u32) -> Vec<Self> {
        let known: u32 = ROUTE_FLAG_NAMES.iter().map(|(b, _)| b).fold(0, |a, b| a | b);
        let mut flags: Vec<Self> = ROUTE_FLAG_NAMES
            .iter()
            .filter(|(bit, _)| bits & bit != 0)
            .map(|(_, f)| *f)
            .collect();
        if bits & !known != 0 {
            flags.push(Self::Other(bits & !known));
        }
        flags
    }
}

/// RTNH_F_* flags on one next hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipathRouteFlag {
    Dead,
    Pervasive,
    OnLink,
    Offload,
    LinkDown,
    Unresolved,
    Trap,
    Other(u8),
}

impl MultipathRouteFlag {
    pub fn from_bits(bits: u8) -> Vec<Self> {
        let table = [
            (route_flags::RTNH_F_DEAD, Self::Dead),
            (route_flags::RTNH_F_PERVASIVE, Self::Pervasive),
            (route_flags::RTNH_F_ONLINK, Self::OnLink),
            (route_flags::RTNH_F_OFFLOAD, Self::Offload),
            (route_flags::RTNH_F_LINKDOWN, Self::LinkDown),
            (route_flags::RTNH_F_UNRESOLVED, Self::Unresolved),
            (route_flags::RTNH_F_TRAP, Self::Trap),
        ];
        let mut flags: Vec<Self> = table
            .iter()
            .filter(|(bit, _)| u32::from(bits) & bit != 0)
            .map(|(_, f)| *f)
            .collect();
        let rest = bits & 0x80;
        if rest != 0 {
            flags.push(Self::Other(rest));
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_names() {
        assert_eq!(
            serde_json::to_string(&RouteProtocol::from(1)).unwrap(),
            r#""icmp_redirect""#
        );
        assert_eq!(
            serde_json::to_string(&RouteProtocol::from(16)).unwrap(),
            r#""dhcp""#
        );
        assert_eq!(RouteProtocol::from(99), RouteProtocol::Other(99));
    }

    #[test]
    fn test_scope_and_preference() {
        assert_eq!(RouteScope::from(253), RouteScope::Link);
        assert_eq!(
            serde_json::to_string(&RouteScope::NoWhere).unwrap(),
            r#""no_where""#
        );
        assert_eq!(RoutePreference::from(3), RoutePreference::Low);
    }

    #[test]
    fn test_route_flags() {
        assert_eq!(
            RouteFlag::from_bits(route_flags::RTNH_F_ONLINK | route_flags::RTM_F_CLONED),
            vec![RouteFlag::OnLink, RouteFlag::Cloned]
        );
        assert_eq!(
            MultipathRouteFlag::from_bits(route_flags::RTNH_F_LINKDOWN as u8),
            vec![MultipathRouteFlag::LinkDown]
        );
    }

    #[test]
    fn test_preference_key_spelling() {
        let mut route = Route::new(AddressFamily::Ipv6, 254);
        route.preference = Some(RoutePreference::High);
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["perference"], "high");
        assert!(json.get("dst").is_none());
    }
}
