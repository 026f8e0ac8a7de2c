use crate::netlink::attr::AttrMap;
use crate::state::{MacSecCipherId, MacSecInfo, MacSecOffload, MacSecValidate};

pub(crate) mod ifla_macsec {
    pub const SCI: u16 = 1;
    pub const PORT: u16 = 2;
    pub const ICV_LEN: u16 = 3;
    pub const CIPHER_SUITE: u16 = 4;
    pub const WINDOW: u16 = 5;
    pub const ENCODING_SA: u16 = 6;
    pub const ENCRYPT: u16 = 7;
    pub const PROTECT: u16 = 8;
    pub const INC_SCI: u16 = 9;
    pub const ES: u16 = 10;
    pub const SCB: u16 = 11;
    pub const REPLAY_PROTECT: u16 = 12;
    pub const VALIDATION: u16 = 13;
    pub const OFFLOAD: u16 = 15;
}

/// Decode IFLA_INFO_DATA of a macsec device. The SCI travels in network
/// byte order.
pub(crate) fn decode(data: &[u8], base: Option<String>) -> MacSecInfo {
    use ifla_macsec as a;

    let attrs = AttrMap::new(data);
    let flag = |kind| attrs.bool(kind).unwrap_or(false);

    MacSecInfo {
        sci: attrs.u64(a::SCI).map(u64::from_be).unwrap_or(0),
        port: attrs.u16_be(a::PORT).unwrap_or(0),
        icv_len: attrs.u8(a::ICV_LEN).unwrap_or(0),
        cipher: attrs
            .u64(a::CIPHER_SUITE)
            .map(MacSecCipherId::from)
            .unwrap_or_default(),
        window: attrs.u32(a::WINDOW).unwrap_or(0),
        encoding_sa: attrs.u8(a::ENCODING_SA).unwrap_or(0),
        encrypt: flag(a::ENCRYPT),
        protect: flag(a::PROTECT),
        send_sci: flag(a::INC_SCI),
        end_station: flag(a::ES),
        scb: flag(a::SCB),
        replay_protect: flag(a::REPLAY_PROTECT),
        validate: attrs
            .u8(a::VALIDATION)
            .map(MacSecValidate::from)
            .unwrap_or_default(),
        offload: attrs.u8(a::OFFLOAD).map(MacSecOffload::from),
        base_iface: base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    #[test]
    fn test_decode_macsec() {
        let sci: u64 = 0x5254_0012_3456_0001;
        let data = MessageBuilder::attrs(|b| {
            b.append_attr(ifla_macsec::SCI, &sci.to_be_bytes());
            b.append_attr_u16_be(ifla_macsec::PORT, 1);
            b.append_attr_u8(ifla_macsec::ICV_LEN, 16);
            b.append_attr_u64(ifla_macsec::CIPHER_SUITE, 0x0080_C200_0100_0002);
            b.append_attr_u8(ifla_macsec::ENCRYPT, 1);
            b.append_attr_u8(ifla_macsec::INC_SCI, 1);
            b.append_attr_u8(ifla_macsec::VALIDATION, 1);
        });
        let info = decode(&data, Some("2".into()));
        assert_eq!(info.sci, sci);
        assert_eq!(info.port, 1);
        assert_eq!(info.cipher, MacSecCipherId::GcmAes256);
        assert!(info.encrypt && info.send_sci);
        assert!(!info.protect);
        assert_eq!(info.validate, MacSecValidate::Check);
        assert!(info.offload.is_none());
        assert_eq!(info.base_iface.as_deref(), Some("2"));
    }
}
