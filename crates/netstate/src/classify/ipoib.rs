use super::DecodeError;
use crate::netlink::attr::AttrMap;
use crate::state::{IpoibInfo, IpoibMode};

pub(crate) mod ifla_ipoib {
    pub const PKEY: u16 = 1;
    pub const MODE: u16 = 2;
    pub const UMCAST: u16 = 3;
}

pub(crate) fn decode(data: &[u8], base: Option<String>) -> Result<IpoibInfo, DecodeError> {
    let attrs = AttrMap::new(data);
    let pkey = attrs
        .u16(ifla_ipoib::PKEY)
        .ok_or_else(|| DecodeError::missing("ipoib", "IFLA_IPOIB_PKEY"))?;
    Ok(IpoibInfo {
        pkey,
        mode: attrs
            .u16(ifla_ipoib::MODE)
            .map(IpoibMode::from)
            .unwrap_or_default(),
        umcast: attrs.u16(ifla_ipoib::UMCAST).is_some_and(|v| v != 0),
        base_iface: base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_decode_ipoib() {
        let data = MessageBuilder::attrs(|b| {
            b.append_attr_u16(ifla_ipoib::PKEY, 0x8001);
            b.append_attr_u16(ifla_ipoib::MODE, 1);
            b.append_attr_u16(ifla_ipoib::UMCAST, 1);
        });
        let info = decode(&data, Some("4".into())).unwrap();
        assert_eq!(info.pkey, 0x8001);
        assert_eq!(info.mode, IpoibMode::Connected);
        assert!(info.umcast);
    }

    #[test]
    fn test_pkey_required() {
        assert_eq!(decode(&[], None).unwrap_err().attribute, "IFLA_IPOIB_PKEY");
    }
}
