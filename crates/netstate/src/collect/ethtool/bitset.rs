//! Ethtool bitsets in the verbose (bit-by-bit) form.
//!
//! Each bit carries its index and name. With a mask the kernel lists every
//! masked bit and flags the set ones; without a mask (NOMASK) it lists only
//! the set bits.

use crate::netlink::attr::{AttrIter, AttrMap, get};

mod ethtool_a_bitset {
    pub const NOMASK: u16 = 1;
    pub const SIZE: u16 = 2;
    pub const BITS: u16 = 3;
}

mod ethtool_a_bitset_bit {
    pub const INDEX: u16 = 1;
    pub const NAME: u16 = 2;
    pub const VALUE: u16 = 3;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bit {
    pub index: u32,
    pub name: String,
    pub value: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Bitset {
    pub size: Option<u32>,
    pub bits: Vec<Bit>,
}

impl Bitset {
    pub fn parse(data: &[u8]) -> Self {
        let attrs = AttrMap::new(data);
        let nomask = attrs.has(ethtool_a_bitset::NOMASK);
        let bits = attrs
            .get(ethtool_a_bitset::BITS)
            .map(|list| {
                AttrIter::new(list)
                    .filter_map(|(_, bit)| parse_bit(bit, nomask))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            size: attrs.u32(ethtool_a_bitset::SIZE),
            bits,
        }
    }

    /// Names of the set bits, in index order.
    pub fn set_names(&self) -> Vec<String> {
        let mut set: Vec<&Bit> = self.bits.iter().filter(|b| b.value).collect();
        set.sort_by_key(|b| b.index);
        set.into_iter().map(|b| b.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bits.iter().any(|b| b.value && b.name == name)
    }
}

fn parse_bit(data: &[u8], nomask: bool) -> Option<Bit> {
    let attrs = AttrMap::new(data);
    let index = attrs.u32(ethtool_a_bitset_bit::INDEX)?;
    let name = attrs
        .get(ethtool_a_bitset_bit::NAME)
        .and_then(|d| get::string(d).ok())
        .filter(|n| !n.is_empty())?
        .to_string();
    Some(Bit {
        index,
        name,
        value: nomask || attrs.has(ethtool_a_bitset_bit::VALUE),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::netlink::MessageBuilder;

    /// Encode a verbose bitset into `b` under attribute `kind`.
    pub(crate) fn put_bitset(
        b: &mut MessageBuilder,
        kind: u16,
        nomask: bool,
        bits: &[(u32, &str, bool)],
    ) {
        let set = b.nest_start(kind);
        if nomask {
            b.append_attr_empty(ethtool_a_bitset::NOMASK);
        }
        b.append_attr_u32(ethtool_a_bitset::SIZE, 64);
        let list = b.nest_start(ethtool_a_bitset::BITS);
        for (index, name, value) in bits {
            let bit = b.nest_start(1);
            b.append_attr_u32(ethtool_a_bitset_bit::INDEX, *index);
            b.append_attr_str(ethtool_a_bitset_bit::NAME, name);
            if *value {
                b.append_attr_empty(ethtool_a_bitset_bit::VALUE);
            }
            b.nest_end(bit);
        }
        b.nest_end(list);
        b.nest_end(set);
    }

    fn parse_one(nomask: bool, bits: &[(u32, &str, bool)]) -> Bitset {
        let outer = MessageBuilder::attrs(|b| put_bitset(b, 7, nomask, bits));
        let (_, data) = AttrIter::new(&outer).next().unwrap();
        Bitset::parse(data)
    }

    #[test]
    fn test_masked_bitset() {
        let set = parse_one(
            false,
            &[(5, "1000baseT/Full", true), (1, "10baseT/Full", false), (3, "100baseT/Full", true)],
        );
        assert_eq!(set.size, Some(64));
        assert_eq!(set.bits.len(), 3);
        assert_eq!(set.set_names(), vec!["100baseT/Full", "1000baseT/Full"]);
        assert!(!set.contains("10baseT/Full"));
    }

    #[test]
    fn test_nomask_bitset_lists_set_bits() {
        let set = parse_one(true, &[(0, "rx-checksum", false), (9, "highdma", false)]);
        assert!(set.contains("rx-checksum"));
        assert!(set.contains("highdma"));
    }
}
