//! Fixed-size kernel headers and attribute id constants.

/// Address families used in dump headers.
pub mod family {
    pub const AF_UNSPEC: u8 = 0;
    pub const AF_INET: u8 = 2;
    pub const AF_BRIDGE: u8 = 7;
    pub const AF_INET6: u8 = 10;
}

/// Decode a fixed header, copying it out so the source needs no alignment.
macro_rules! impl_header {
    ($ty:ty) => {
        impl $ty {
            /// Size of this structure.
            pub const SIZE: usize = std::mem::size_of::<Self>();

            /// Convert to bytes.
            pub fn as_bytes(&self) -> &[u8] {
                <Self as zerocopy::IntoBytes>::as_bytes(self)
            }

            /// Parse from bytes.
            pub fn from_bytes(data: &[u8]) -> crate::netlink::Result<Self> {
                <Self as zerocopy::FromBytes>::read_from_prefix(data)
                    .map(|(hdr, _)| hdr)
                    .map_err(|_| crate::netlink::Error::Truncated {
                        expected: Self::SIZE,
                        actual: data.len(),
                    })
            }
        }
    };
}

pub(crate) use impl_header;

pub mod addr;
pub mod link;
pub mod route;
pub mod rule;
