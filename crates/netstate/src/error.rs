//! Snapshot-level errors.

use crate::classify::DecodeError;
use crate::netlink;

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors that abort a snapshot build.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// A kernel subsystem could not be reached.
    #[error("{subsystem} unavailable: {message}")]
    SystemUnavailable {
        /// Collector or subsystem name.
        subsystem: &'static str,
        message: String,
    },

    /// The kernel refused the request (EPERM/EACCES).
    #[error("{subsystem}: permission denied: {message}")]
    PermissionDenied {
        subsystem: &'static str,
        message: String,
    },

    /// A bounded wait expired. Retrying may succeed.
    #[error("{subsystem}: timed out: {message}")]
    Timeout {
        subsystem: &'static str,
        message: String,
    },

    /// A kernel record lacked a required attribute.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The assembled snapshot violates its own invariants.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// The caller cancelled the build.
    #[error("snapshot cancelled")]
    Cancelled,

    /// The request options are unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SnapshotError {
    /// Map a collector's transport failure onto the snapshot taxonomy.
    pub fn from_netlink(subsystem: &'static str, err: &netlink::Error) -> Self {
        let message = err.to_string();
        if err.is_permission_denied() {
            Self::PermissionDenied { subsystem, message }
        } else if err.is_timeout() {
            Self::Timeout { subsystem, message }
        } else {
            Self::SystemUnavailable { subsystem, message }
        }
    }

    /// Map a filesystem failure (sysfs, procfs, resolv.conf).
    pub fn from_io(subsystem: &'static str, err: &std::io::Error) -> Self {
        let message = err.to_string();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { subsystem, message },
            std::io::ErrorKind::TimedOut => Self::Timeout { subsystem, message },
            _ => Self::SystemUnavailable { subsystem, message },
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
