//! Device directory: read-only queries against the endpoint backend.
//!
//! The directory answers three questions: which render endpoints exist, what
//! an endpoint is called, and which endpoint is the default for a role. It
//! holds no synchronization state and never fails outward: missing data is a
//! normal state and degrades to an empty list, `None`, or the id itself.

mod backend;
mod mock;

pub use backend::{
    DataFlow, DefaultDeviceNotification, EndpointBackend, EndpointInfo, NotificationCallback,
    NotificationRegistration, Role,
};
pub use mock::MockBackend;

use std::sync::Arc;

/// A render endpoint as shown to the operator.
///
/// Identity is the `id`. Values are snapshots of a single enumeration and
/// should not be kept beyond one menu-build or decision cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    /// OS-assigned stable endpoint id.
    pub id: String,
    /// Friendly name, or the id when no name could be read.
    pub display_name: String,
}

impl DeviceEndpoint {
    fn from_info(info: EndpointInfo) -> Self {
        let display_name = info.friendly_name.unwrap_or_else(|| info.id.clone());
        Self {
            id: info.id,
            display_name,
        }
    }

    /// Returns `true` if this endpoint has the given id.
    ///
    /// Endpoint ids are compared case-insensitively, as the OS does.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

/// Query service over an [`EndpointBackend`].
#[derive(Clone)]
pub struct DeviceDirectory {
    backend: Arc<dyn EndpointBackend>,
}

impl DeviceDirectory {
    /// Creates a directory backed by `backend`.
    pub fn new(backend: Arc<dyn EndpointBackend>) -> Self {
        Self { backend }
    }

    /// Lists the currently active render endpoints.
    ///
    /// Order is not stable across calls. Enumeration failure yields an empty
    /// list, since having no devices is a legitimate state during hot-plug.
    pub fn list_active_render_endpoints(&self) -> Vec<DeviceEndpoint> {
        match self.backend.active_endpoints(DataFlow::Render) {
            Ok(endpoints) => endpoints.into_iter().map(DeviceEndpoint::from_info).collect(),
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "endpoint enumeration failed");
                Vec::new()
            }
        }
    }

    /// Returns the friendly name of endpoint `id`, or `id` itself if the name
    /// cannot be read for any reason.
    pub fn resolve_name(&self, id: &str) -> String {
        match self.backend.friendly_name(id) {
            Ok(Some(name)) => name,
            Ok(None) => id.to_string(),
            Err(e) => {
                tracing::debug!(device_id = id, error = %e, "friendly name unavailable");
                id.to_string()
            }
        }
    }

    /// Returns the current default render endpoint for `role`, if one is assigned.
    pub fn default_endpoint(&self, role: Role) -> Option<String> {
        match self.backend.default_endpoint(DataFlow::Render, role) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(%role, error = %e, "default endpoint query failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for DeviceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDirectory")
            .field("backend", &self.backend.name())
            .finish()
    }
}
