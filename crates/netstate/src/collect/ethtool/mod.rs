//! Ethtool settings (generic netlink family `ethtool`).
//!
//! Each section is one dump over all devices. Replies carry the device in
//! their request header nest and are grouped by name. A section the kernel
//! or driver does not support is left out rather than reported.

mod bitset;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tracing::{debug, warn};

use self::bitset::Bitset;
use super::{Collection, is_absent};
use crate::error::{Result, SnapshotError};
use crate::netlink::attr::AttrMap;
use crate::netlink::genl::{GenlConnection, GenlMsgHdr};
use crate::state::{
    EthtoolCoalesceInfo, EthtoolFeatureInfo, EthtoolInfo, EthtoolLinkModeDuplex,
    EthtoolLinkModeInfo, EthtoolPauseInfo, EthtoolRingInfo, Warning, WarningSource,
};

pub const ETHTOOL_GENL_NAME: &str = "ethtool";
pub const ETHTOOL_GENL_VERSION: u8 = 1;

/// Attribute 1 of every reply is the request header nest.
const ETHTOOL_A_HEADER: u16 = 1;

mod ethtool_a_header {
    pub const DEV_NAME: u16 = 2;
}

mod ethtool_msg {
    pub const LINKMODES_GET: u8 = 4;
    pub const FEATURES_GET: u8 = 11;
    pub const RINGS_GET: u8 = 15;
    pub const COALESCE_GET: u8 = 19;
    pub const PAUSE_GET: u8 = 21;
}

pub(crate) mod ethtool_a_linkmodes {
    pub const AUTONEG: u16 = 2;
    pub const OURS: u16 = 3;
    pub const PEER: u16 = 4;
    pub const SPEED: u16 = 5;
    pub const DUPLEX: u16 = 6;
}

pub(crate) mod ethtool_a_features {
    pub const HW: u16 = 2;
    pub const ACTIVE: u16 = 4;
    pub const NOCHANGE: u16 = 5;
}

pub(crate) mod ethtool_a_rings {
    pub const RX_MAX: u16 = 2;
    pub const RX_MINI_MAX: u16 = 3;
    pub const RX_JUMBO_MAX: u16 = 4;
    pub const TX_MAX: u16 = 5;
    pub const RX: u16 = 6;
    pub const RX_MINI: u16 = 7;
    pub const RX_JUMBO: u16 = 8;
    pub const TX: u16 = 9;
}

pub(crate) mod ethtool_a_coalesce {
    pub const RX_USECS: u16 = 2;
    pub const RX_MAX_FRAMES: u16 = 3;
    pub const RX_USECS_IRQ: u16 = 4;
    pub const RX_MAX_FRAMES_IRQ: u16 = 5;
    pub const TX_USECS: u16 = 6;
    pub const TX_MAX_FRAMES: u16 = 7;
    pub const TX_USECS_IRQ: u16 = 8;
    pub const TX_MAX_FRAMES_IRQ: u16 = 9;
    pub const STATS_BLOCK_USECS: u16 = 10;
    pub const USE_ADAPTIVE_RX: u16 = 11;
    pub const USE_ADAPTIVE_TX: u16 = 12;
    pub const PKT_RATE_LOW: u16 = 13;
    pub const RX_USECS_LOW: u16 = 14;
    pub const RX_MAX_FRAMES_LOW: u16 = 15;
    pub const TX_USECS_LOW: u16 = 16;
    pub const TX_MAX_FRAMES_LOW: u16 = 17;
    pub const PKT_RATE_HIGH: u16 = 18;
    pub const RX_USECS_HIGH: u16 = 19;
    pub const RX_MAX_FRAMES_HIGH: u16 = 20;
    pub const TX_USECS_HIGH: u16 = 21;
    pub const TX_MAX_FRAMES_HIGH: u16 = 22;
    pub const RATE_SAMPLE_INTERVAL: u16 = 23;
}

pub(crate) mod ethtool_a_pause {
    pub const AUTONEG: u16 = 2;
    pub const RX: u16 = 3;
    pub const TX: u16 = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    LinkModes,
    Features,
    Rings,
    Coalesce,
    Pause,
}

impl Section {
    const ALL: [Section; 5] = [
        Section::LinkModes,
        Section::Features,
        Section::Rings,
        Section::Coalesce,
        Section::Pause,
    ];

    fn cmd(self) -> u8 {
        match self {
            Section::LinkModes => ethtool_msg::LINKMODES_GET,
            Section::Features => ethtool_msg::FEATURES_GET,
            Section::Rings => ethtool_msg::RINGS_GET,
            Section::Coalesce => ethtool_msg::COALESCE_GET,
            Section::Pause => ethtool_msg::PAUSE_GET,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Section::LinkModes => "linkmodes",
            Section::Features => "features",
            Section::Rings => "rings",
            Section::Coalesce => "coalesce",
            Section::Pause => "pause",
        }
    }

    fn apply(self, attrs: &AttrMap<'_>, info: &mut EthtoolInfo) {
        match self {
            Section::LinkModes => info.link_mode = Some(parse_link_modes(attrs)),
            Section::Features => info.features = Some(parse_features(attrs)),
            Section::Rings => info.ring = Some(parse_rings(attrs)),
            Section::Coalesce => info.coalesce = Some(parse_coalesce(attrs)),
            Section::Pause => info.pause = Some(parse_pause(attrs)),
        }
    }
}

/// Query every section for every device. Keyed by interface name.
///
/// Absent when the ethtool family is not registered.
pub async fn collect(
    timeout: Duration,
) -> Result<Option<Collection<HashMap<String, EthtoolInfo>>>> {
    let conn = GenlConnection::new()
        .map_err(|e| SnapshotError::from_netlink("ethtool", &e))?
        .with_timeout(timeout);
    let family = match conn.get_family(ETHTOOL_GENL_NAME).await {
        Ok(family) => family,
        Err(e) if is_absent(&e) => {
            debug!("ethtool family not registered");
            return Ok(None);
        }
        Err(e) => return Err(SnapshotError::from_netlink("ethtool", &e)),
    };

    let mut infos: HashMap<String, EthtoolInfo> = HashMap::new();
    let mut warnings = Vec::new();

    for section in Section::ALL {
        let replies = match conn
            .dump_command(family.id, section.cmd(), ETHTOOL_GENL_VERSION, |_| {})
            .await
        {
            Ok(replies) => replies,
            Err(e) if is_absent(&e) => {
                debug!(section = section.name(), "ethtool section not supported");
                continue;
            }
            Err(e) => {
                warn!(section = section.name(), error = %e, "ethtool dump failed");
                warnings.push(Warning::new(
                    WarningSource::Ethtool,
                    format!("{} dump failed: {e}", section.name()),
                ));
                continue;
            }
        };
        merge_replies(section, &replies, &mut infos);
    }

    infos.retain(|_, info| !info.is_empty());
    debug!(devices = infos.len(), "ethtool collected");
    Ok(Some(Collection::with_warnings(infos, warnings)))
}

fn merge_replies(section: Section, replies: &[Vec<u8>], infos: &mut HashMap<String, EthtoolInfo>) {
    for payload in replies {
        let attrs = AttrMap::new(GenlMsgHdr::attrs(payload));
        let Some(dev) = device_name(&attrs) else {
            continue;
        };
        section.apply(&attrs, infos.entry(dev).or_default());
    }
}

fn device_name(attrs: &AttrMap<'_>) -> Option<String> {
    let header = AttrMap::new(attrs.get(ETHTOOL_A_HEADER)?);
    header
        .string(ethtool_a_header::DEV_NAME)
        .filter(|n| !n.is_empty())
}

fn flag(attrs: &AttrMap<'_>, kind: u16) -> bool {
    attrs.u8(kind).is_some_and(|v| v != 0)
}

pub(crate) fn parse_pause(attrs: &AttrMap<'_>) -> EthtoolPauseInfo {
    use ethtool_a_pause as a;
    EthtoolPauseInfo {
        rx: flag(attrs, a::RX),
        tx: flag(attrs, a::TX),
        auto_negotiate: flag(attrs, a::AUTONEG),
    }
}

/// A feature the hardware can toggle and the kernel does not pin is
/// changeable; everything else is fixed. Values are the active state.
pub(crate) fn parse_features(attrs: &AttrMap<'_>) -> EthtoolFeatureInfo {
    use ethtool_a_features as a;

    let bitset = |kind| attrs.get(kind).map(Bitset::parse).unwrap_or_default();
    let hw = bitset(a::HW);
    let active = bitset(a::ACTIVE);
    let nochange = bitset(a::NOCHANGE);

    let mut fixed = BTreeMap::new();
    let mut changeable = BTreeMap::new();
    for bit in &hw.bits {
        let on = active.contains(&bit.name);
        if bit.value && !nochange.contains(&bit.name) {
            changeable.insert(bit.name.clone(), on);
        } else {
            fixed.insert(bit.name.clone(), on);
        }
    }
    EthtoolFeatureInfo { fixed, changeable }
}

pub(crate) fn parse_rings(attrs: &AttrMap<'_>) -> EthtoolRingInfo {
    use ethtool_a_rings as a;
    EthtoolRingInfo {
        rx: attrs.u32(a::RX),
        rx_max: attrs.u32(a::RX_MAX),
        rx_jumbo: attrs.u32(a::RX_JUMBO),
        rx_jumbo_max: attrs.u32(a::RX_JUMBO_MAX),
        rx_mini: attrs.u32(a::RX_MINI),
        rx_mini_max: attrs.u32(a::RX_MINI_MAX),
        tx: attrs.u32(a::TX),
        tx_max: attrs.u32(a::TX_MAX),
    }
}

pub(crate) fn parse_coalesce(attrs: &AttrMap<'_>) -> EthtoolCoalesceInfo {
    use ethtool_a_coalesce as a;
    EthtoolCoalesceInfo {
        pkt_rate_high: attrs.u32(a::PKT_RATE_HIGH),
        pkt_rate_low: attrs.u32(a::PKT_RATE_LOW),
        rate_sample_interval: attrs.u32(a::RATE_SAMPLE_INTERVAL),
        rx_max_frames: attrs.u32(a::RX_MAX_FRAMES),
        rx_max_frames_high: attrs.u32(a::RX_MAX_FRAMES_HIGH),
        rx_max_frames_irq: attrs.u32(a::RX_MAX_FRAMES_IRQ),
        rx_max_frames_low: attrs.u32(a::RX_MAX_FRAMES_LOW),
        rx_usecs: attrs.u32(a::RX_USECS),
        rx_usecs_high: attrs.u32(a::RX_USECS_HIGH),
        rx_usecs_irq: attrs.u32(a::RX_USECS_IRQ),
        rx_usecs_low: attrs.u32(a::RX_USECS_LOW),
        stats_block_usecs: attrs.u32(a::STATS_BLOCK_USECS),
        tx_max_frames: attrs.u32(a::TX_MAX_FRAMES),
        tx_max_frames_high: attrs.u32(a::TX_MAX_FRAMES_HIGH),
        tx_max_frames_irq: attrs.u32(a::TX_MAX_FRAMES_IRQ),
        tx_max_frames_low: attrs.u32(a::TX_MAX_FRAMES_LOW),
        tx_usecs: attrs.u32(a::TX_USECS),
        tx_usecs_high: attrs.u32(a::TX_USECS_HIGH),
        tx_usecs_irq: attrs.u32(a::TX_USECS_IRQ),
        tx_usecs_low: attrs.u32(a::TX_USECS_LOW),
        use_adaptive_rx: attrs.u8(a::USE_ADAPTIVE_RX).map(|v| v != 0),
        use_adaptive_tx: attrs.u8(a::USE_ADAPTIVE_TX).map(|v| v != 0),
    }
}

/// `ours` is the advertised subset of the supported modes.
pub(crate) fn parse_link_modes(attrs: &AttrMap<'_>) -> EthtoolLinkModeInfo {
    use ethtool_a_linkmodes as a;
    EthtoolLinkModeInfo {
        auto_negotiate: flag(attrs, a::AUTONEG),
        ours: attrs
            .get(a::OURS)
            .map(|d| Bitset::parse(d).set_names())
            .unwrap_or_default(),
        peer: attrs.get(a::PEER).map(|d| Bitset::parse(d).set_names()),
        // SPEED_UNKNOWN is u32::MAX
        speed: attrs.u32(a::SPEED).filter(|s| *s != u32::MAX).unwrap_or(0),
        duplex: attrs
            .u8(a::DUPLEX)
            .map(EthtoolLinkModeDuplex::from)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::bitset::tests::put_bitset;
    use super::*;
    use crate::netlink::MessageBuilder;

    fn reply(cmd: u8, dev: &str, body: impl FnOnce(&mut MessageBuilder)) -> Vec<u8> {
        let mut payload = zerocopy::IntoBytes::as_bytes(&GenlMsgHdr::new(cmd, 1)).to_vec();
        payload.extend(MessageBuilder::attrs(|b| {
            let hdr = b.nest_start(ETHTOOL_A_HEADER);
            b.append_attr_str(ethtool_a_header::DEV_NAME, dev);
            b.nest_end(hdr);
            body(b);
        }));
        payload
    }

    #[test]
    fn test_features_split() {
        let attrs = MessageBuilder::attrs(|b| {
            put_bitset(
                b,
                ethtool_a_features::HW,
                false,
                &[
                    (0, "tx-scatter-gather", true),
                    (5, "highdma", false),
                    (12, "rx-gro", true),
                    (20, "netns-local", true),
                ],
            );
            put_bitset(
                b,
                ethtool_a_features::ACTIVE,
                true,
                &[(5, "highdma", true), (12, "rx-gro", true), (20, "netns-local", true)],
            );
            put_bitset(b, ethtool_a_features::NOCHANGE, true, &[(20, "netns-local", true)]);
        });
        let features = parse_features(&AttrMap::new(&attrs));
        assert_eq!(
            features.changeable,
            BTreeMap::from([("rx-gro".to_string(), true), ("tx-scatter-gather".to_string(), false)])
        );
        assert_eq!(
            features.fixed,
            BTreeMap::from([("highdma".to_string(), true), ("netns-local".to_string(), true)])
        );
    }

    #[test]
    fn test_link_modes() {
        let attrs = MessageBuilder::attrs(|b| {
            b.append_attr_u8(ethtool_a_linkmodes::AUTONEG, 1);
            put_bitset(
                b,
                ethtool_a_linkmodes::OURS,
                false,
                &[(4, "1000baseT/Half", false), (5, "1000baseT/Full", true), (3, "100baseT/Full", true)],
            );
            b.append_attr_u32(ethtool_a_linkmodes::SPEED, 1000);
            b.append_attr_u8(ethtool_a_linkmodes::DUPLEX, 1);
        });
        let modes = parse_link_modes(&AttrMap::new(&attrs));
        assert!(modes.auto_negotiate);
        assert_eq!(modes.ours, vec!["100baseT/Full", "1000baseT/Full"]);
        assert!(modes.peer.is_none());
        assert_eq!(modes.speed, 1000);
        assert_eq!(modes.duplex, EthtoolLinkModeDuplex::Full);
    }

    #[test]
    fn test_unknown_speed_is_zero() {
        let attrs = MessageBuilder::attrs(|b| {
            b.append_attr_u32(ethtool_a_linkmodes::SPEED, u32::MAX);
            b.append_attr_u8(ethtool_a_linkmodes::DUPLEX, 0xff);
        });
        let modes = parse_link_modes(&AttrMap::new(&attrs));
        assert_eq!(modes.speed, 0);
        assert_eq!(modes.duplex, EthtoolLinkModeDuplex::Unknown);
        assert!(modes.ours.is_empty());
    }

    #[test]
    fn test_merge_groups_by_device() {
        let mut infos = HashMap::new();
        let pause = [
            reply(ethtool_msg::PAUSE_GET, "eth0", |b| {
                b.append_attr_u8(ethtool_a_pause::RX, 1);
                b.append_attr_u8(ethtool_a_pause::TX, 1);
                b.append_attr_u8(ethtool_a_pause::AUTONEG, 0);
            }),
            reply(ethtool_msg::PAUSE_GET, "eth1", |b| {
                b.append_attr_u8(ethtool_a_pause::RX, 0);
            }),
        ];
        let rings = [reply(ethtool_msg::RINGS_GET, "eth0", |b| {
            b.append_attr_u32(ethtool_a_rings::RX, 256);
            b.append_attr_u32(ethtool_a_rings::RX_MAX, 4096);
        })];
        merge_replies(Section::Pause, &pause, &mut infos);
        merge_replies(Section::Rings, &rings, &mut infos);

        let eth0 = &infos["eth0"];
        assert_eq!(
            eth0.pause,
            Some(EthtoolPauseInfo {
                rx: true,
                tx: true,
                auto_negotiate: false
            })
        );
        assert_eq!(eth0.ring.as_ref().and_then(|r| r.rx_max), Some(4096));
        assert!(eth0.ring.as_ref().is_some_and(|r| r.tx.is_none()));
        assert!(infos["eth1"].ring.is_none());
    }

    #[test]
    fn test_coalesce_optional_fields() {
        let attrs = MessageBuilder::attrs(|b| {
            b.append_attr_u32(ethtool_a_coalesce::RX_USECS, 50);
            b.append_attr_u8(ethtool_a_coalesce::USE_ADAPTIVE_RX, 1);
        });
        let coalesce = parse_coalesce(&AttrMap::new(&attrs));
        assert_eq!(coalesce.rx_usecs, Some(50));
        assert_eq!(coalesce.use_adaptive_rx, Some(true));
        assert!(coalesce.tx_usecs.is_none());
        assert!(coalesce.use_adaptive_tx.is_none());
    }
}
