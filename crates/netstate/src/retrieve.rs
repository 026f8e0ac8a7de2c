//! Snapshot pipeline: collect, classify, resolve, aggregate.
//!
//! Collectors run as independent tasks and are joined before anything is
//! assembled, so no collector sees another's partial output. Only the link
//! collector is mandatory. The cancellation token is checked between
//! stages.

use std::collections::BTreeMap;
use std::future::Future;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::aggregate::{SnapshotParts, aggregate};
use crate::classify::build_iface;
use crate::collect::{self, Collection};
use crate::error::{Result, SnapshotError};
use crate::filter;
use crate::netlink::messages::LinkMessage;
use crate::options::RetrieveOptions;
use crate::resolve::{Membership, resolve};
use crate::state::{Iface, NetworkStateSnapshot, Warning, WarningSource};

/// Build one snapshot of the host's network state.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use netstate::{RetrieveOptions, retrieve};
///
/// let opts = RetrieveOptions::new()
///     .with_timeout(Duration::from_secs(2))
///     .ethtool(false);
/// let snapshot = retrieve(&opts).await?;
/// for (name, iface) in &snapshot.ifaces {
///     println!("{name}: {:?}", iface.iface_type);
/// }
/// ```
pub async fn retrieve(opts: &RetrieveOptions) -> Result<NetworkStateSnapshot> {
    if opts.timeout.is_zero() {
        return Err(SnapshotError::InvalidArgument(
            "timeout must be greater than zero".into(),
        ));
    }
    if opts.iface_name.as_deref().is_some_and(str::is_empty) {
        return Err(SnapshotError::InvalidArgument(
            "interface name must not be empty".into(),
        ));
    }
    let cancel = &opts.cancel;
    check_cancelled(cancel)?;

    let timeout = opts.timeout;
    if let Some(name) = &opts.iface_name {
        collect::link::lookup(name, timeout).await?;
        check_cancelled(cancel)?;
    }
    let link = tokio::spawn(collect::link::collect(timeout, opts.bridge_vlans));
    let address = spawn_if(opts.addresses, collect::address::collect(timeout));
    let routes = spawn_if(opts.routes, collect::route::collect(timeout));
    let rules = spawn_if(opts.rules, collect::rule::collect(timeout));
    let ethtool = spawn_if(opts.ethtool, collect::ethtool::collect(timeout));
    let mptcp = spawn_if(opts.mptcp, {
        let procfs = opts.procfs_root.clone();
        async move { collect::mptcp::collect(&procfs, timeout).await }
    });
    let dns = spawn_if(opts.dns, {
        let path = opts.resolv_conf.clone();
        async move { collect::dns::collect(&path).await }
    });

    let (link, address, routes, rules, ethtool, mptcp, dns) = tokio::join!(
        joined(link),
        joined_optional(address),
        joined_optional(routes),
        joined_optional(rules),
        joined_optional(ethtool),
        joined_optional(mptcp),
        joined_optional(dns),
    );
    check_cancelled(cancel)?;

    let mut warnings = Vec::new();
    let link = match link? {
        Ok(collection) => take(collection, &mut warnings),
        Err(e) => {
            warn!(error = %e, "link collection failed");
            return Err(e);
        }
    };
    let addresses =
        secondary_optional(WarningSource::Address, address?, &mut warnings).unwrap_or_default();
    let routes =
        secondary_optional(WarningSource::Route, routes?, &mut warnings).unwrap_or_default();
    let rules =
        secondary_optional(WarningSource::Rule, rules?, &mut warnings).unwrap_or_default();
    // These three report an absent subsystem as Ok(None).
    let ethtool = secondary_optional(
        WarningSource::Ethtool,
        ethtool?.and_then(|r| r.transpose()),
        &mut warnings,
    )
    .unwrap_or_default();
    let mptcp = secondary_optional(
        WarningSource::Mptcp,
        mptcp?.and_then(|r| r.transpose()),
        &mut warnings,
    );
    let dns = secondary_optional(
        WarningSource::Dns,
        dns?.and_then(|r| r.transpose()),
        &mut warnings,
    );

    // VF records ride on the link dump; only the sysfs lookups remain.
    let sriov = if opts.sriov {
        take(
            collect::sriov::collect(&link.links, &opts.sysfs_root).await,
            &mut warnings,
        )
    } else {
        Default::default()
    };
    check_cancelled(cancel)?;

    let (mut ifaces, memberships) = take(classify_links(&link.links), &mut warnings);
    check_cancelled(cancel)?;

    resolve(&mut ifaces, &memberships, &link.bridge_vlans);
    check_cancelled(cancel)?;

    let mut snapshot = aggregate(SnapshotParts {
        ifaces,
        addresses,
        routes,
        rules,
        dns,
        mptcp,
        sriov,
        ethtool,
        warnings,
    })?;
    if let Some(name) = &opts.iface_name {
        filter::select_iface(&mut snapshot, name)?;
    }
    filter::apply(&mut snapshot, &opts.route_filter, &opts.rule_filter);
    Ok(snapshot)
}

/// Classify every link. A link that fails to decode is dropped together
/// with its membership and reported as a `classify` warning.
pub(crate) fn classify_links(
    links: &[LinkMessage],
) -> Collection<(BTreeMap<String, Iface>, Vec<Membership>)> {
    let mut ifaces = BTreeMap::new();
    let mut memberships = Vec::new();
    let mut warnings = Vec::new();
    for msg in links {
        match build_iface(msg) {
            Ok(iface) => {
                if let Some(membership) = Membership::from_link(msg) {
                    memberships.push(membership);
                }
                ifaces.insert(iface.name.clone(), iface);
            }
            Err(e) => {
                debug!(iface = msg.name_or_empty(), error = %e, "dropping link");
                warnings.push(Warning::for_iface(
                    WarningSource::Classify,
                    msg.name_or_empty(),
                    e.to_string(),
                ));
            }
        }
    }
    Collection::with_warnings((ifaces, memberships), warnings)
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        debug!("snapshot cancelled");
        return Err(SnapshotError::Cancelled);
    }
    Ok(())
}

fn spawn_if<F>(enabled: bool, fut: F) -> Option<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    enabled.then(|| tokio::spawn(fut))
}

fn join_error(err: JoinError) -> SnapshotError {
    SnapshotError::InternalInconsistency(format!("collector task failed: {err}"))
}

async fn joined<T>(handle: JoinHandle<T>) -> Result<T> {
    handle.await.map_err(join_error)
}

async fn joined_optional<T>(handle: Option<JoinHandle<T>>) -> Result<Option<T>> {
    match handle {
        Some(handle) => handle.await.map(Some).map_err(join_error),
        None => Ok(None),
    }
}

fn take<T>(collection: Collection<T>, warnings: &mut Vec<Warning>) -> T {
    warnings.extend(collection.warnings);
    collection.data
}

/// A non-mandatory collector's failure becomes a warning.
fn secondary<T>(
    source: WarningSource,
    result: Result<Collection<T>>,
    warnings: &mut Vec<Warning>,
) -> Option<T> {
    match result {
        Ok(collection) => Some(take(collection, warnings)),
        Err(e) => {
            warn!(%source, error = %e, "collector failed");
            warnings.push(Warning::new(source, format!("collector failed: {e}")));
            None
        }
    }
}

fn secondary_optional<T>(
    source: WarningSource,
    result: Option<Result<Collection<T>>>,
    warnings: &mut Vec<Warning>,
) -> Option<T> {
    result.and_then(|r| secondary(source, r, warnings))
}

/// Error categories exposed to bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrieveErrorKind {
    InvalidArgument,
    PermissionDenied,
    /// An internal defect: decoding, invariant or serialization failure.
    Bug,
    NotSupported,
    Timeout,
    Cancelled,
}

impl std::fmt::Display for RetrieveErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::PermissionDenied => "PermissionDenied",
            Self::Bug => "Bug",
            Self::NotSupported => "NotSupported",
            Self::Timeout => "Timeout",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Error returned by [`retrieve_state`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RetrieveError {
    pub kind: RetrieveErrorKind,
    pub message: String,
}

impl RetrieveError {
    pub fn new(kind: RetrieveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<SnapshotError> for RetrieveError {
    fn from(err: SnapshotError) -> Self {
        let kind = match &err {
            SnapshotError::SystemUnavailable { .. } => RetrieveErrorKind::NotSupported,
            SnapshotError::PermissionDenied { .. } => RetrieveErrorKind::PermissionDenied,
            SnapshotError::Timeout { .. } => RetrieveErrorKind::Timeout,
            SnapshotError::Decode(_) | SnapshotError::InternalInconsistency(_) => {
                RetrieveErrorKind::Bug
            }
            SnapshotError::Cancelled => RetrieveErrorKind::Cancelled,
            SnapshotError::InvalidArgument(_) => RetrieveErrorKind::InvalidArgument,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<serde_json::Error> for RetrieveError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(RetrieveErrorKind::Bug, format!("serialization failed: {err}"))
    }
}

/// Serialize a snapshot to its JSON contract.
pub fn to_json(snapshot: &NetworkStateSnapshot) -> std::result::Result<Vec<u8>, RetrieveError> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Build a snapshot with default options and return it as JSON.
///
/// Runs its own single-threaded runtime, so it must not be called from
/// within an async context; use [`retrieve`] there.
pub fn retrieve_state() -> std::result::Result<Vec<u8>, RetrieveError> {
    retrieve_state_with(&RetrieveOptions::default())
}

/// [`retrieve_state`] with explicit options.
pub fn retrieve_state_with(opts: &RetrieveOptions) -> std::result::Result<Vec<u8>, RetrieveError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            RetrieveError::new(
                RetrieveErrorKind::NotSupported,
                format!("cannot start runtime: {e}"),
            )
        })?;
    let snapshot = runtime.block_on(retrieve(opts))?;
    to_json(&snapshot)
}
