use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-device ethtool settings. A section is absent when the driver does
/// not support it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pause: Option<EthtoolPauseInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub features: Option<EthtoolFeatureInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coalesce: Option<EthtoolCoalesceInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ring: Option<EthtoolRingInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub link_mode: Option<EthtoolLinkModeInfo>,
}

impl EthtoolInfo {
    pub fn is_empty(&self) -> bool {
        self.pause.is_none()
            && self.features.is_none()
            && self.coalesce.is_none()
            && self.ring.is_none()
            && self.link_mode.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolPauseInfo {
    pub rx: bool,
    pub tx: bool,
    pub auto_negotiate: bool,
}

/// Offload features split by whether the driver lets them be toggled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolFeatureInfo {
    pub fixed: BTreeMap<String, bool>,
    pub changeable: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolCoalesceInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pkt_rate_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pkt_rate_low: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rate_sample_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_max_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_max_frames_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_max_frames_irq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_max_frames_low: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_usecs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_usecs_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_usecs_irq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_usecs_low: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stats_block_usecs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_max_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_max_frames_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_max_frames_irq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_max_frames_low: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_usecs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_usecs_high: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_usecs_irq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_usecs_low: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_adaptive_rx: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_adaptive_tx: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolRingInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_jumbo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_jumbo_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_mini: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rx_mini_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_max: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthtoolLinkModeDuplex {
    Half,
    Full,
    #[default]
    Unknown,
    Other(u8),
}

impl From<u8> for EthtoolLinkModeDuplex {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Half,
            1 => Self::Full,
            0xff => Self::Unknown,
            v => Self::Other(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthtoolLinkModeInfo {
    pub auto_negotiate: bool,
    /// Link modes advertised by this end.
    pub ours: Vec<String>,
    /// Link modes advertised by the link partner.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peer: Option<Vec<String>>,
    /// Mb/s; 0 when unknown.
    pub speed: u32,
    pub duplex: EthtoolLinkModeDuplex,
}
