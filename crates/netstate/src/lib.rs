//! Read-only snapshot engine for Linux network state.
//!
//! One call queries links, addresses, routes, rules, bonding and bridging
//! status, SR-IOV virtual functions, MPTCP endpoints, ethtool settings and
//! the resolver config, and returns a single serializable snapshot.
//!
//! The pipeline is Collect → Classify → Resolve → Aggregate → Serialize:
//!
//! - [`collect`] runs one collector per kernel subsystem, concurrently;
//! - [`classify`] turns each raw link into an interface with its
//!   type-specific extension;
//! - [`resolve`] attaches controllers and renames index references;
//! - [`aggregate`] assembles and checks the [`NetworkStateSnapshot`].
//!
//! # Example
//!
//! ```ignore
//! use netstate::{RetrieveOptions, retrieve};
//!
//! #[tokio::main]
//! async fn main() -> netstate::Result<()> {
//!     let snapshot = retrieve(&RetrieveOptions::default()).await?;
//!     for (name, iface) in &snapshot.ifaces {
//!         println!("{name}: {:?} {:?}", iface.iface_type, iface.state);
//!     }
//!     for warning in &snapshot.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Bindings that only need bytes use [`retrieve_state`], which returns the
//! snapshot JSON.

pub mod aggregate;
pub mod classify;
pub mod collect;
pub mod error;
pub mod filter;
pub mod netlink;
pub mod options;
pub mod resolve;
pub mod retrieve;
pub mod state;

#[cfg(test)]
mod fixtures;

pub use classify::DecodeError;
pub use error::{Result, SnapshotError};
pub use filter::{RouteFilter, RuleFilter};
pub use options::RetrieveOptions;
pub use retrieve::{
    RetrieveError, RetrieveErrorKind, retrieve, retrieve_state, retrieve_state_with, to_json,
};
pub use state::{Iface, InterfaceType, NetworkStateSnapshot, Warning, WarningSource};
