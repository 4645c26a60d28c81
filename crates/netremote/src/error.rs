//! Error types for control-socket and netlink operations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for netremote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to hostapd/wpa_supplicant or nl80211.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A key-value property was declared without the trailing `=` delimiter.
    #[error("malformed key spec {key:?}: key must be non-empty and end with '='")]
    MalformedKeySpec {
        /// The offending key.
        key: String,
    },

    /// The daemon's control socket could not be reached.
    #[error("cannot connect to control socket {}: {source}", path.display())]
    ControlSocketConnect {
        /// Path of the daemon's control socket.
        path: PathBuf,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The daemon did not answer within the configured timeout.
    #[error("no reply from control socket {} after {timeout:?}", path.display())]
    Timeout {
        /// Path of the daemon's control socket.
        path: PathBuf,
        /// The receive timeout that elapsed.
        timeout: Duration,
    },

    /// The daemon rejected a command.
    #[error("command {command:?} failed: {reply}")]
    CommandFailed {
        /// The command payload that was sent.
        command: String,
        /// The daemon's reply.
        reply: String,
    },

    /// A reply could not be interpreted.
    #[error("unexpected reply to {command:?}: {reply}")]
    UnexpectedReply {
        /// The command payload that was sent.
        command: String,
        /// The daemon's reply.
        reply: String,
    },

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

    /// Generic netlink family is not registered with the kernel.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that was not found.
        name: String,
    },

    /// Generic netlink family does not expose a multicast group.
    #[error("multicast group {group} not found in family {family}")]
    MulticastGroupNotFound {
        /// The family that was queried.
        family: String,
        /// The missing group name.
        group: String,
    },

    /// Wireless device not found.
    #[error("wiphy not found: phy{index}")]
    WiphyNotFound {
        /// The wiphy index that was not found.
        index: u32,
    },

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
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

    /// Check if this is a "not found" error.
    ///
    /// Covers ENOENT/ENODEV from the kernel, unknown families and groups,
    /// unknown devices, and control sockets that do not exist (daemon not running).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::ControlSocketConnect { source, .. } => {
                matches!(
                    source.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
                )
            }
            Self::FamilyNotFound { .. }
            | Self::MulticastGroupNotFound { .. }
            | Self::WiphyNotFound { .. }
            | Self::InterfaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            Self::ControlSocketConnect { source, .. } | Self::Io(source) => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }

    /// Check if this error came from the transport rather than the protocol.
    ///
    /// Transport errors are recoverable: the caller may retry once the daemon
    /// is back.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::ControlSocketConnect { .. } | Self::Timeout { .. }
        )
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
