//! Error types for comm-sync.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`CommSyncError`]): Prevent the service from starting or
//!   report that it has already shut down
//! - **Recoverable errors** ([`EndpointError`]): Failed calls into the OS audio
//!   subsystem. These are logged with their diagnostic code and never escape
//!   the synchronization engine or the notification subscriber.

use std::path::PathBuf;

/// Fatal errors returned from service construction and control.
#[derive(Debug, thiserror::Error)]
pub enum CommSyncError {
    /// No usable endpoint backend exists on this platform.
    #[error("audio endpoint backend unavailable: {reason}")]
    BackendUnavailable {
        /// Why the backend could not be created.
        reason: String,
    },

    /// The command serializer has shut down and no longer accepts events.
    #[error("sync service stopped")]
    ServiceStopped,

    /// The log file could not be opened.
    #[error("log file error: {path}: {source}")]
    LogFile {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// COM could not be initialised on the calling thread.
    #[error("COM initialisation failed (HRESULT 0x{code:08X})")]
    ComInit {
        /// The HRESULT returned by `CoInitializeEx`.
        code: i32,
    },
}

impl CommSyncError {
    /// Creates a backend-unavailable error with the given reason.
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a log file error for the given path.
    pub fn log_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogFile {
            path: path.into(),
            source,
        }
    }
}

/// Recoverable failures reported by an [`EndpointBackend`](crate::EndpointBackend).
///
/// Endpoint calls are best-effort: a failure abandons the current event and
/// leaves the routing state unchanged. A later device change or manual pick
/// naturally retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// Setting a default endpoint was rejected by the OS.
    #[error("SetDefaultEndpoint failed (HRESULT 0x{code:08X})")]
    SetDefaultFailed {
        /// Status code returned by the OS.
        code: i32,
    },

    /// Any other OS call failed with a status code.
    #[error("{operation} failed (HRESULT 0x{code:08X})")]
    Os {
        /// The OS call that failed.
        operation: &'static str,
        /// Status code returned by the OS.
        code: i32,
    },

    /// The backend cannot perform this operation on this platform.
    #[error("{operation} is not supported by this backend")]
    Unsupported {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Backend-specific failure without a numeric status.
    #[error("audio backend error: {0}")]
    Backend(String),
}

impl EndpointError {
    /// Creates an OS error for the given operation and status code.
    pub fn os(operation: &'static str, code: i32) -> Self {
        Self::Os { operation, code }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns the OS diagnostic code, if the failure carried one.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::SetDefaultFailed { code } | Self::Os { code, .. } => Some(*code),
            Self::Unsupported { .. } | Self::Backend(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_default_failed_display() {
        let err = EndpointError::SetDefaultFailed {
            code: 0x8007_0490_u32 as i32,
        };
        assert_eq!(
            err.to_string(),
            "SetDefaultEndpoint failed (HRESULT 0x80070490)"
        );
        assert_eq!(err.code(), Some(0x8007_0490_u32 as i32));
    }

    #[test]
    fn test_os_error_display() {
        let err = EndpointError::os("EnumAudioEndpoints", 0x8889_0004_u32 as i32);
        assert_eq!(
            err.to_string(),
            "EnumAudioEndpoints failed (HRESULT 0x88890004)"
        );
    }

    #[test]
    fn test_unsupported_has_no_code() {
        let err = EndpointError::unsupported("SetDefaultEndpoint");
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_log_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CommSyncError::log_file("/tmp/log.txt", io_err);
        assert!(err.to_string().contains("/tmp/log.txt"));
    }

    #[test]
    fn test_com_init_display() {
        let err = CommSyncError::ComInit {
            code: 0x8001_0106_u32 as i32,
        };
        assert_eq!(
            err.to_string(),
            "COM initialisation failed (HRESULT 0x80010106)"
        );
    }
}
