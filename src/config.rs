//! Configuration types for the sync service.

use std::time::Duration;

/// Configuration for the synchronization service.
///
/// Use [`SyncConfig::default()`] for the standard behavior, or customize as needed.
///
/// # Example
///
/// ```
/// use comm_sync::SyncConfig;
///
/// let config = SyncConfig {
///     sync_on_start: true,
///     ..Default::default()
/// };
/// assert!(config.sync_enabled);
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Whether automatic synchronization starts enabled.
    ///
    /// Default: `true`
    pub sync_enabled: bool,

    /// Align the communications default with the current console default
    /// immediately after the service starts.
    ///
    /// When `false`, the service only reacts to subsequent changes.
    /// Default: `false`
    pub sync_on_start: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            sync_on_start: false,
        }
    }
}

/// Rotation settings for [`FileLogSink`](crate::FileLogSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLogConfig {
    /// Files larger than this are moved aside to `<file>.old`.
    ///
    /// Default: 100 000 bytes
    pub max_size: u64,

    /// Minimum time between two size checks.
    ///
    /// Default: 60 minutes
    pub rotate_check_interval: Duration,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            max_size: 100_000,
            rotate_check_interval: Duration::from_secs(60 * 60),
        }
    }
}
