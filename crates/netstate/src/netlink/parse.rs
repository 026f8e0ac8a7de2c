//! Parser combinators and the `FromNetlink` trait for typed message parsing.
//!
//! Top-level rtnetlink messages (links, addresses, routes, rules) are parsed
//! with winnow: a fixed header followed by a run of attributes.
//!
//! ```ignore
//! use netstate::netlink::parse::FromNetlink;
//! use netstate::netlink::messages::LinkMessage;
//!
//! let link = LinkMessage::from_bytes(payload)?;
//! ```

use winnow::binary::le_u16;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Trait for types that can be parsed from netlink wire format.
pub trait FromNetlink: Sized {
    /// Parse from a mutable byte slice reference.
    /// The slice is advanced past the consumed bytes.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Parse from a complete byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse
            .parse(data)
            .map_err(|e| Error::Parse(format!("{}", e)))
    }

    /// Write the header required for dump requests.
    /// This is appended to the netlink message after the nlmsghdr.
    fn write_dump_header(_buf: &mut Vec<u8>) {}
}

/// Parse a netlink attribute header and return (type, payload).
///
/// The returned type still carries the `NLA_F_*` flag bits.
pub fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let len = le_u16.parse_next(input)? as usize;
    let attr_type = le_u16.parse_next(input)?;

    if len < 4 {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    let payload: &[u8] = take(len - 4).parse_next(input)?;

    // Align to 4 bytes; the last attribute may omit its padding
    let padding = ((len + 3) & !3) - len;
    if input.len() >= padding {
        let _: &[u8] = take(padding).parse_next(input)?;
    }

    Ok((attr_type, payload))
}

/// Parse attributes until the input is exhausted.
///
/// A malformed trailing attribute ends the walk without failing the message.
/// The whole input is consumed.
pub fn parse_attrs<'a>(input: &mut &'a [u8]) -> PResult<Vec<(u16, &'a [u8])>> {
    let mut attrs = Vec::new();
    while input.len() >= 4 {
        match parse_attr(input) {
            Ok(attr) => attrs.push(attr),
            Err(_) => break,
        }
    }
    // Trailing bytes are dropped so `from_bytes` sees a fully consumed input
    *input = &input[input.len()..];
    Ok(attrs)
}

/// Parse a string from a fixed-size buffer (null-terminated).
pub fn parse_string_from_bytes(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Take a fixed-size header off the front of the input.
pub fn parse_header<'a>(input: &mut &'a [u8], size: usize) -> PResult<&'a [u8]> {
    take(size).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attr_with_padding() {
        // len=5 type=3 "a\0" + pad, then len=8 type=4 u32
        let mut data: Vec<u8> = vec![6, 0, 3, 0, b'a', 0, 0, 0];
        data.extend_from_slice(&[8, 0, 4, 0]);
        data.extend_from_slice(&1500u32.to_ne_bytes());

        let mut input = data.as_slice();
        let attrs = parse_attrs(&mut input).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(parse_string_from_bytes(attrs[0].1), "a");
        assert_eq!(attrs[1].0, 4);
        assert_eq!(attrs[1].1, 1500u32.to_ne_bytes());
    }

    #[test]
    fn test_parse_attr_rejects_short_len() {
        let data = [2u8, 0, 1, 0];
        assert!(parse_attr(&mut data.as_ref()).is_err());
    }

    #[test]
    fn test_parse_attrs_stops_on_garbage() {
        let mut data: Vec<u8> = vec![8, 0, 1, 0, 1, 0, 0, 0];
        data.extend_from_slice(&[0xff, 0x00, 0x02, 0x00]);
        let attrs = parse_attrs(&mut data.as_slice()).unwrap();
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_string_from_bytes_lossy() {
        assert_eq!(parse_string_from_bytes(b"eth0\0\0\0"), "eth0");
        assert_eq!(parse_string_from_bytes(b"bond0"), "bond0");
    }
}
