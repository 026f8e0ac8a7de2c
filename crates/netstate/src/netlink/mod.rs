//! Async netlink transport for Linux.
//!
//! Read-only: every request is either a dump or a single get. Each
//! exchange is bounded by the connection's timeout.
//!
//! # Quick Start
//!
//! ```ignore
//! use netstate::netlink::{Connection, Protocol};
//! use netstate::netlink::messages::LinkMessage;
//! use netstate::netlink::message::NlMsgType;
//!
//! let conn = Connection::new(Protocol::Route)?;
//! let dump = conn.dump_typed::<LinkMessage>(NlMsgType::RTM_GETLINK).await?;
//! for link in &dump.records {
//!     println!("{}: {}", link.ifindex(), link.name_or_empty());
//! }
//! ```

pub mod attr;
mod builder;
pub mod connection;
mod error;
pub mod genl;
pub mod message;
pub mod messages;
pub mod parse;
mod socket;
pub mod types;

pub use attr::{AttrIter, AttrMap, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::{Connection, Dump};
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use parse::FromNetlink;
pub use socket::{NetlinkSocket, Protocol};
