//! Strongly-typed rtnetlink message structures.
//!
//! # Example
//!
//! ```ignore
//! use netstate::netlink::messages::RouteMessage;
//! use netstate::netlink::parse::FromNetlink;
//!
//! let msg = RouteMessage::from_bytes(&payload)?;
//! println!("table {}", msg.table_id());
//! ```

mod address;
mod link;
mod route;
mod rule;

pub use address::*;
pub use link::*;
pub use route::*;
pub use rule::*;
