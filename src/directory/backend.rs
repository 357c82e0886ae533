//! The boundary between the sync core and the OS audio subsystem.

use std::fmt;
use std::sync::Arc;

use crate::EndpointError;

/// Direction of an audio endpoint, with the native `EDataFlow` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFlow {
    /// Output (playback) endpoints.
    Render = 0,
    /// Input (recording) endpoints.
    Capture = 1,
    /// Both directions.
    All = 2,
}

impl DataFlow {
    /// Converts a native `EDataFlow` value.
    #[must_use]
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Render),
            1 => Some(Self::Capture),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// Default-device role, with the native `ERole` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// General-purpose default used by most applications.
    Console = 0,
    /// Music and movie playback.
    Multimedia = 1,
    /// Calls and VoIP.
    Communications = 2,
}

impl Role {
    /// Converts a native `ERole` value.
    #[must_use]
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Console),
            1 => Some(Self::Multimedia),
            2 => Some(Self::Communications),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Console => "console",
            Self::Multimedia => "multimedia",
            Self::Communications => "communications",
        })
    }
}

/// An endpoint as reported by the backend, before name fallback is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    /// OS-assigned endpoint id.
    pub id: String,
    /// Friendly name from the property store, if it could be read.
    pub friendly_name: Option<String>,
}

/// A raw default-device-changed notification as delivered by the OS.
///
/// Nothing has been filtered yet: flows, roles and missing ids all pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDeviceNotification {
    /// Flow whose default changed.
    pub flow: DataFlow,
    /// Role whose default changed.
    pub role: Role,
    /// New default endpoint, or `None` when the role has no default anymore.
    pub device_id: Option<String>,
}

/// Callback invoked on an OS-owned thread for every default-device change.
pub type NotificationCallback = Arc<dyn Fn(DefaultDeviceNotification) + Send + Sync>;

/// Handle to a registered notification callback.
///
/// Implementations must make `unregister` idempotent: the subscriber calls it on
/// orderly shutdown and again from `Drop` on abnormal paths.
pub trait NotificationRegistration: Send {
    /// Removes the callback from the OS subsystem.
    fn unregister(&mut self) -> Result<(), EndpointError>;
}

/// Access to the OS audio endpoint subsystem.
///
/// Every OS object acquired inside a call must be released before the call
/// returns, on success and failure alike. Implementations are called from the
/// serializer's blocking context, from menu builders, and from arbitrary
/// threads, so they must be `Send + Sync`.
pub trait EndpointBackend: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &'static str;

    /// Lists active (present and enabled) endpoints for `flow`.
    fn active_endpoints(&self, flow: DataFlow) -> Result<Vec<EndpointInfo>, EndpointError>;

    /// Reads the friendly name of endpoint `id`.
    ///
    /// Returns `Ok(None)` when the endpoint exists but has no name property.
    fn friendly_name(&self, id: &str) -> Result<Option<String>, EndpointError>;

    /// Returns the current default endpoint for `(flow, role)`.
    fn default_endpoint(&self, flow: DataFlow, role: Role)
        -> Result<Option<String>, EndpointError>;

    /// Makes `id` the default endpoint for `role`.
    ///
    /// Synchronous and blocking; there is no timeout or cancellation.
    fn set_default_endpoint(&self, id: &str, role: Role) -> Result<(), EndpointError>;

    /// Registers `callback` for default-device-changed notifications.
    fn register_default_device_callback(
        &self,
        callback: NotificationCallback,
    ) -> Result<Box<dyn NotificationRegistration>, EndpointError>;
}
