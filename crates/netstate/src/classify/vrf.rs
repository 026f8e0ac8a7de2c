use super::DecodeError;
use crate::netlink::attr::AttrMap;
use crate::state::{VrfInfo, VrfSubordinateInfo};

const IFLA_VRF_TABLE: u16 = 1;
const IFLA_VRF_PORT_TABLE: u16 = 1;

pub(crate) fn decode(data: &[u8]) -> Result<VrfInfo, DecodeError> {
    let table_id = AttrMap::new(data)
        .u32(IFLA_VRF_TABLE)
        .ok_or_else(|| DecodeError::missing("vrf", "IFLA_VRF_TABLE"))?;
    Ok(VrfInfo {
        table_id,
        subordinates: Vec::new(),
    })
}

/// Decode IFLA_INFO_SLAVE_DATA of a VRF member.
pub(crate) fn decode_subordinate(data: &[u8]) -> VrfSubordinateInfo {
    VrfSubordinateInfo {
        table_id: AttrMap::new(data).u32(IFLA_VRF_PORT_TABLE).unwrap_or(0),
    }
}
