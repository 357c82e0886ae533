//! `IMMNotificationClient` implementation forwarding default-device changes.

#![allow(non_snake_case)]

use windows::core::{implement, PCWSTR};
use windows::Win32::Media::Audio::{
    EDataFlow, ERole, IMMNotificationClient, IMMNotificationClient_Impl, DEVICE_STATE,
};
use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;

use crate::directory::{DataFlow, DefaultDeviceNotification, NotificationCallback, Role};

/// Runs on an OS-owned thread. The callback must not block.
#[implement(IMMNotificationClient)]
pub(super) struct NotificationClient {
    callback: NotificationCallback,
}

impl NotificationClient {
    pub(super) fn new(callback: NotificationCallback) -> Self {
        Self { callback }
    }
}

impl IMMNotificationClient_Impl for NotificationClient_Impl {
    fn OnDeviceStateChanged(&self, _device_id: &PCWSTR, _state: DEVICE_STATE) -> windows::core::Result<()> {
        Ok(())
    }

    fn OnDeviceAdded(&self, _device_id: &PCWSTR) -> windows::core::Result<()> {
        Ok(())
    }

    fn OnDeviceRemoved(&self, _device_id: &PCWSTR) -> windows::core::Result<()> {
        Ok(())
    }

    fn OnDefaultDeviceChanged(
        &self,
        flow: EDataFlow,
        role: ERole,
        default_device_id: &PCWSTR,
    ) -> windows::core::Result<()> {
        let (Some(flow), Some(role)) = (DataFlow::from_raw(flow.0), Role::from_raw(role.0)) else {
            tracing::debug!(flow = flow.0, role = role.0, "ignoring unknown flow/role");
            return Ok(());
        };

        let device_id = if default_device_id.is_null() {
            None
        } else {
            // SAFETY: non-null, NUL-terminated and valid for this call
            unsafe { default_device_id.to_string() }.ok()
        };

        (self.callback)(DefaultDeviceNotification {
            flow,
            role,
            device_id,
        });
        Ok(())
    }

    fn OnPropertyValueChanged(&self, _device_id: &PCWSTR, _key: &PROPERTYKEY) -> windows::core::Result<()> {
        Ok(())
    }
}
