//! `EndpointBackend` over MMDevice and the policy-config interface.

use windows::core::PCWSTR;
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{
    EDataFlow, ERole, IMMDevice, IMMDeviceEnumerator, IMMNotificationClient,
    MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL, STGM_READ};

use super::com::{self, CoTaskString};
use super::notification::NotificationClient;
use super::policy_config::{IPolicyConfig, CLSID_POLICY_CONFIG_CLIENT};
use crate::directory::{
    DataFlow, EndpointBackend, EndpointInfo, NotificationCallback, NotificationRegistration, Role,
};
use crate::{CommSyncError, EndpointError};

/// `HRESULT_FROM_WIN32(ERROR_NOT_FOUND)`, returned when a role has no default.
const E_NOT_FOUND: i32 = 0x8007_0490_u32 as i32;

fn os_error(operation: &'static str, error: &windows::core::Error) -> EndpointError {
    EndpointError::os(operation, error.code().0)
}

/// Endpoint backend for Windows.
///
/// Holds no COM objects between calls: each operation creates the enumerator
/// or policy-config client it needs and releases it before returning.
#[derive(Debug)]
pub struct WasapiBackend {
    _private: (),
}

impl WasapiBackend {
    /// Joins the COM apartment and verifies the device enumerator is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ComInit` if COM cannot be initialized, or `BackendUnavailable`
    /// if the enumerator cannot be created.
    pub fn new() -> Result<Self, CommSyncError> {
        com::ensure_apartment().map_err(|e| CommSyncError::ComInit {
            code: e.code().unwrap_or_default(),
        })?;
        Self::enumerator().map_err(|e| CommSyncError::backend_unavailable(e.to_string()))?;
        Ok(Self { _private: () })
    }

    fn enumerator() -> Result<IMMDeviceEnumerator, EndpointError> {
        com::ensure_apartment()?;
        // SAFETY: standard in-process activation of a registered coclass
        unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
            .map_err(|e| os_error("CoCreateInstance(MMDeviceEnumerator)", &e))
    }

    fn device(enumerator: &IMMDeviceEnumerator, id: &str) -> Result<IMMDevice, EndpointError> {
        let wide = com::to_wide(id);
        // SAFETY: `wide` is NUL-terminated and outlives the call
        unsafe { enumerator.GetDevice(PCWSTR(wide.as_ptr())) }.map_err(|e| os_error("GetDevice", &e))
    }
}

fn device_id(device: &IMMDevice) -> Result<String, EndpointError> {
    // SAFETY: GetId hands over a CoTaskMem string, owned by the guard
    let raw = unsafe { device.GetId() }.map_err(|e| os_error("GetId", &e))?;
    CoTaskString::new(raw).to_owned_string()
}

fn read_friendly_name(device: &IMMDevice) -> Result<Option<String>, EndpointError> {
    // SAFETY: read-only property store on a live device
    let store = unsafe { device.OpenPropertyStore(STGM_READ) }
        .map_err(|e| os_error("OpenPropertyStore", &e))?;
    // SAFETY: the key is a static PROPERTYKEY; the variant clears itself on drop
    let value = unsafe { store.GetValue(&PKEY_Device_FriendlyName) }
        .map_err(|e| os_error("GetValue", &e))?;

    let name = value.to_string();
    Ok((!name.is_empty()).then_some(name))
}

impl EndpointBackend for WasapiBackend {
    fn name(&self) -> &'static str {
        "WASAPI"
    }

    fn active_endpoints(&self, flow: DataFlow) -> Result<Vec<EndpointInfo>, EndpointError> {
        let enumerator = Self::enumerator()?;
        // SAFETY: plain enumeration call on a live enumerator
        let collection = unsafe { enumerator.EnumAudioEndpoints(EDataFlow(flow as i32), DEVICE_STATE_ACTIVE) }
            .map_err(|e| os_error("EnumAudioEndpoints", &e))?;
        // SAFETY: as above
        let count = unsafe { collection.GetCount() }.map_err(|e| os_error("GetCount", &e))?;

        let mut endpoints = Vec::with_capacity(count as usize);
        for index in 0..count {
            // SAFETY: index is within GetCount
            let device = match unsafe { collection.Item(index) } {
                Ok(device) => device,
                Err(e) => {
                    tracing::debug!(index, error = %e, "skipping unreadable endpoint");
                    continue;
                }
            };
            let id = match device_id(&device) {
                Ok(id) => id,
                Err(e) => {
                    tracing::debug!(index, error = %e, "skipping endpoint without id");
                    continue;
                }
            };
            let friendly_name = read_friendly_name(&device).unwrap_or_else(|e| {
                tracing::debug!(id = %id, error = %e, "no friendly name");
                None
            });
            endpoints.push(EndpointInfo { id, friendly_name });
        }

        Ok(endpoints)
    }

    fn friendly_name(&self, id: &str) -> Result<Option<String>, EndpointError> {
        let enumerator = Self::enumerator()?;
        let device = Self::device(&enumerator, id)?;
        read_friendly_name(&device)
    }

    fn default_endpoint(&self, flow: DataFlow, role: Role) -> Result<Option<String>, EndpointError> {
        let enumerator = Self::enumerator()?;
        // SAFETY: plain query on a live enumerator
        match unsafe { enumerator.GetDefaultAudioEndpoint(EDataFlow(flow as i32), ERole(role as i32)) } {
            Ok(device) => device_id(&device).map(Some),
            Err(e) if e.code().0 == E_NOT_FOUND => Ok(None),
            Err(e) => Err(os_error("GetDefaultAudioEndpoint", &e)),
        }
    }

    fn set_default_endpoint(&self, id: &str, role: Role) -> Result<(), EndpointError> {
        com::ensure_apartment()?;
        // SAFETY: standard in-process activation of a registered coclass
        let policy: IPolicyConfig = unsafe { CoCreateInstance(&CLSID_POLICY_CONFIG_CLIENT, None, CLSCTX_ALL) }
            .map_err(|e| os_error("CoCreateInstance(PolicyConfigClient)", &e))?;

        let wide = com::to_wide(id);
        // SAFETY: `wide` is NUL-terminated and outlives the call
        let hr = unsafe { policy.SetDefaultEndpoint(PCWSTR(wide.as_ptr()), ERole(role as i32)) };
        if hr.is_err() {
            return Err(EndpointError::SetDefaultFailed { code: hr.0 });
        }
        Ok(())
    }

    fn register_default_device_callback(
        &self,
        callback: NotificationCallback,
    ) -> Result<Box<dyn NotificationRegistration>, EndpointError> {
        let enumerator = Self::enumerator()?;
        let client: IMMNotificationClient = NotificationClient::new(callback).into();
        // SAFETY: the client stays alive in the registration until unregistered
        unsafe { enumerator.RegisterEndpointNotificationCallback(&client) }
            .map_err(|e| os_error("RegisterEndpointNotificationCallback", &e))?;

        tracing::debug!("registered endpoint notification client");
        Ok(Box::new(WasapiRegistration {
            enumerator,
            client,
            active: true,
        }))
    }
}

/// Keeps the enumerator and client alive for the lifetime of the subscription.
struct WasapiRegistration {
    enumerator: IMMDeviceEnumerator,
    client: IMMNotificationClient,
    active: bool,
}

// SAFETY: both objects were created in the multithreaded apartment, whose
// interfaces are callable from any MTA thread; `unregister` joins the MTA
// before touching them.
unsafe impl Send for WasapiRegistration {}

impl NotificationRegistration for WasapiRegistration {
    fn unregister(&mut self) -> Result<(), EndpointError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        com::ensure_apartment()?;
        // SAFETY: unregisters the same client passed at registration
        unsafe { self.enumerator.UnregisterEndpointNotificationCallback(&self.client) }
            .map_err(|e| os_error("UnregisterEndpointNotificationCallback", &e))
    }
}

impl Drop for WasapiRegistration {
    fn drop(&mut self) {
        if let Err(e) = self.unregister() {
            tracing::warn!(error = %e, "failed to unregister notification client");
        }
    }
}
