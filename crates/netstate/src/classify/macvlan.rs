use super::{DecodeError, addr_list};
use crate::netlink::attr::{AttrMap, get};
use crate::state::{MacVlanInfo, MacVlanMode};

pub(crate) mod ifla_macvlan {
    pub const MODE: u16 = 1;
    pub const FLAGS: u16 = 2;
    pub const MACADDR: u16 = 4;
    pub const MACADDR_DATA: u16 = 5;
    pub const MACADDR_COUNT: u16 = 6;
}

/// Decode IFLA_INFO_DATA of a macvlan or macvtap (`kind`).
///
/// The allow list is only meaningful in source mode and is left unset
/// otherwise.
pub(crate) fn decode(
    kind: &'static str,
    data: &[u8],
    base: Option<String>,
) -> Result<MacVlanInfo, DecodeError> {
    use ifla_macvlan as a;

    let attrs = AttrMap::new(data);
    let mode = attrs
        .u32(a::MODE)
        .map(MacVlanMode::from)
        .ok_or_else(|| DecodeError::missing(kind, "IFLA_MACVLAN_MODE"))?;

    let allowed_mac_addresses = match mode {
        MacVlanMode::Source => {
            let mut macs = attrs
                .get(a::MACADDR_DATA)
                .map(|nest| addr_list(nest, |d| (d.len() == 6).then(|| get::mac(d))))
                .unwrap_or_default();
            if macs.is_empty() {
                macs.extend(attrs.mac(a::MACADDR));
            }
            let count = attrs.u32(a::MACADDR_COUNT).map(|c| c as usize);
            if let Some(count) = count {
                macs.truncate(count);
            }
            Some(macs)
        }
        _ => None,
    };

    Ok(MacVlanInfo {
        base_iface: base.unwrap_or_default(),
        mode,
        flags: attrs.u16(a::FLAGS).unwrap_or(0),
        allowed_mac_addresses,
    })
}
