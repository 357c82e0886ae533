//! Read-only endpoint backend over CPAL, for platforms without default-role control.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::directory::{
    DataFlow, EndpointBackend, EndpointInfo, NotificationCallback, NotificationRegistration, Role,
};
use crate::EndpointError;

/// Endpoint directory backed by the CPAL default host.
///
/// CPAL exposes device names but not stable ids or per-role defaults, so the
/// name doubles as the id and the default output device answers every role.
/// Setting defaults and receiving notifications are unsupported, which leaves
/// the service running in its degraded mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    /// Creates a backend over the default CPAL host.
    pub fn new() -> Self {
        Self
    }

    fn device_names(flow: DataFlow) -> Result<Vec<String>, EndpointError> {
        let host = cpal::default_host();
        let mut names = Vec::new();

        if matches!(flow, DataFlow::Render | DataFlow::All) {
            let devices = host
                .output_devices()
                .map_err(|e| EndpointError::backend(e.to_string()))?;
            names.extend(devices.filter_map(|d| d.name().ok()));
        }
        if matches!(flow, DataFlow::Capture | DataFlow::All) {
            let devices = host
                .input_devices()
                .map_err(|e| EndpointError::backend(e.to_string()))?;
            names.extend(devices.filter_map(|d| d.name().ok()));
        }

        Ok(names)
    }
}

impl EndpointBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "CPAL"
    }

    fn active_endpoints(&self, flow: DataFlow) -> Result<Vec<EndpointInfo>, EndpointError> {
        Ok(Self::device_names(flow)?
            .into_iter()
            .map(|name| EndpointInfo {
                id: name.clone(),
                friendly_name: Some(name),
            })
            .collect())
    }

    fn friendly_name(&self, id: &str) -> Result<Option<String>, EndpointError> {
        if Self::device_names(DataFlow::All)?.iter().any(|name| name == id) {
            Ok(Some(id.to_string()))
        } else {
            Err(EndpointError::backend(format!("device not found: {id}")))
        }
    }

    fn default_endpoint(
        &self,
        flow: DataFlow,
        _role: Role,
    ) -> Result<Option<String>, EndpointError> {
        let host = cpal::default_host();
        let device = match flow {
            DataFlow::Render | DataFlow::All => host.default_output_device(),
            DataFlow::Capture => host.default_input_device(),
        };
        Ok(device.and_then(|d| d.name().ok()))
    }

    fn set_default_endpoint(&self, _id: &str, _role: Role) -> Result<(), EndpointError> {
        Err(EndpointError::unsupported("SetDefaultEndpoint"))
    }

    fn register_default_device_callback(
        &self,
        _callback: NotificationCallback,
    ) -> Result<Box<dyn NotificationRegistration>, EndpointError> {
        Err(EndpointError::unsupported("RegisterEndpointNotificationCallback"))
    }
}
