//! Error types for netlink operations.

use std::io;
use std::time::Duration;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Generic netlink family is not registered with the kernel.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that was looked up.
        name: String,
    },

    /// No reply arrived within the bounded wait.
    #[error("{operation} timed out after {}ms", elapsed.as_millis())]
    Timeout {
        /// The request that was waiting.
        operation: String,
        /// How long the request waited.
        elapsed: Duration,
    },
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::KernelWithContext {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FamilyNotFound { .. } => true,
            _ => matches!(self.errno(), Some(2 | 19)), // ENOENT=2, ENODEV=19
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == io::ErrorKind::PermissionDenied,
            _ => matches!(self.errno(), Some(1 | 13)), // EPERM=1, EACCES=13
        }
    }

    /// Check if the kernel does not implement the request (EOPNOTSUPP, EPROTONOSUPPORT).
    pub fn is_not_supported(&self) -> bool {
        match self {
            Self::Io(e) => matches!(e.raw_os_error(), Some(libc::EPROTONOSUPPORT)),
            _ => matches!(
                self.errno(),
                Some(libc::EOPNOTSUPP | libc::EPROTONOSUPPORT | libc::EAFNOSUPPORT)
            ),
        }
    }

    /// Check if this error is a bounded-wait expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_errno() {
        let err = Error::from_errno(-1); // EPERM
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
    }

    #[test]
    fn test_with_context() {
        let err = Error::from_errno(-13).with_context("dumping links"); // EACCES
        assert!(err.is_permission_denied());
        assert!(err.to_string().contains("dumping links"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::from_errno(-2).is_not_found());
        assert!(Error::from_errno(-19).is_not_found());
        assert!(
            Error::FamilyNotFound {
                name: "mptcp_pm".into()
            }
            .is_not_found()
        );
        assert!(!Error::from_errno(-1).is_not_found());
    }

    #[test]
    fn test_is_not_supported() {
        assert!(Error::from_errno(-libc::EOPNOTSUPP).is_not_supported());
        assert!(Error::Io(io::Error::from_raw_os_error(libc::EPROTONOSUPPORT)).is_not_supported());
        assert!(!Error::from_errno(-libc::EBUSY).is_not_supported());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::FamilyNotFound {
            name: "ethtool".into(),
        };
        assert_eq!(err.to_string(), "generic netlink family not found: ethtool");

        let err = Error::Timeout {
            operation: "RTM_GETLINK dump".into(),
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "RTM_GETLINK dump timed out after 250ms");
        assert!(err.is_timeout());
    }
}
