//! Source collectors.
//!
//! One collector per kernel subsystem. Each opens and owns its own channel
//! and returns raw-ish records plus the per-record problems it skipped.
//! A collector only fails when its channel cannot be used at all.

pub mod address;
pub mod dns;
pub mod ethtool;
pub mod link;
pub mod mptcp;
pub mod route;
pub mod rule;
pub mod sriov;

use crate::netlink::{self, Dump};
use crate::state::{Warning, WarningSource};

/// Output of one collector.
#[derive(Debug, Clone, Default)]
pub struct Collection<T> {
    pub data: T,
    /// Records that were skipped or degraded.
    pub warnings: Vec<Warning>,
}

impl<T> Collection<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(data: T, warnings: Vec<Warning>) -> Self {
        Self { data, warnings }
    }
}

/// Warnings for the unparseable messages and the interrupt flag of a dump.
pub(crate) fn dump_warnings<T>(source: WarningSource, dump: &Dump<T>) -> Vec<Warning> {
    let mut warnings: Vec<Warning> = dump
        .malformed
        .iter()
        .map(|e| Warning::new(source, format!("skipped malformed message: {e}")))
        .collect();
    if dump.interrupted {
        warnings.push(Warning::new(
            source,
            "dump interrupted by a concurrent change; records may be inconsistent",
        ));
    }
    warnings
}

/// Extend `into` with the records of `dump`, keeping its warnings.
pub(crate) fn merge_dump<T>(
    source: WarningSource,
    dump: Dump<T>,
    into: &mut Vec<T>,
    warnings: &mut Vec<Warning>,
) {
    warnings.extend(dump_warnings(source, &dump));
    into.extend(dump.records);
}

/// Whether an error means the queried facility does not exist here.
pub(crate) fn is_absent(err: &netlink::Error) -> bool {
    err.is_not_found() || err.is_not_supported()
}
