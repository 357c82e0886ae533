//! Notification subscriber: OS default-device callbacks in, domain events out.
//!
//! The callback runs on a thread owned by the OS audio subsystem, so it does
//! nothing but filter and enqueue. All decisions happen later, in the
//! serializer's execution context.

use std::sync::Arc;

use crate::directory::{
    DataFlow, DefaultDeviceNotification, EndpointBackend, NotificationRegistration, Role,
};
use crate::pipeline::CommandSender;
use crate::{DomainEvent, EndpointError};

/// Translates a raw notification into a domain event.
///
/// Only `(Render, Console)` changes with a device id qualify. Capture devices,
/// other roles (including the communications changes this crate causes) and
/// "no default anymore" notifications yield `None`.
///
/// # Example
///
/// ```
/// use comm_sync::{translate_notification, DataFlow, DefaultDeviceNotification, DomainEvent, Role};
///
/// let raw = DefaultDeviceNotification {
///     flow: DataFlow::Render,
///     role: Role::Console,
///     device_id: Some("spk".to_string()),
/// };
/// assert_eq!(translate_notification(raw), Some(DomainEvent::console_changed("spk")));
/// ```
#[must_use]
pub fn translate_notification(notification: DefaultDeviceNotification) -> Option<DomainEvent> {
    match notification {
        DefaultDeviceNotification {
            flow: DataFlow::Render,
            role: Role::Console,
            device_id: Some(device_id),
        } => Some(DomainEvent::DefaultConsoleDeviceChanged { device_id }),
        _ => None,
    }
}

/// A live registration for default-device notifications.
///
/// Qualifying notifications are handed to the [`CommandSender`]; the engine is
/// never called from the notification thread. The registration is removed by
/// [`unregister`](Self::unregister), and again on drop if that never happened.
pub struct NotificationSubscriber {
    registration: Option<Box<dyn NotificationRegistration>>,
}

impl NotificationSubscriber {
    /// Registers for notifications on `backend`, forwarding events to `commands`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if registration is refused.
    pub fn subscribe(
        backend: &dyn EndpointBackend,
        commands: CommandSender,
    ) -> Result<Self, EndpointError> {
        let callback = Arc::new(move |notification: DefaultDeviceNotification| {
            let Some(event) = translate_notification(notification) else {
                return;
            };
            if let Err(e) = commands.submit(event) {
                tracing::debug!(error = %e, "notification after shutdown ignored");
            }
        });

        let registration = backend.register_default_device_callback(callback)?;
        tracing::debug!(backend = backend.name(), "default-device notifications registered");
        Ok(Self {
            registration: Some(registration),
        })
    }

    /// Returns `true` while the registration is active.
    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Removes the registration. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the OS refuses to unregister. The
    /// registration is considered gone either way.
    pub fn unregister(&mut self) -> Result<(), EndpointError> {
        match self.registration.take() {
            Some(mut registration) => registration.unregister(),
            None => Ok(()),
        }
    }
}

impl Drop for NotificationSubscriber {
    fn drop(&mut self) {
        if let Err(e) = self.unregister() {
            tracing::warn!(error = %e, "failed to unregister notifications during drop");
        }
    }
}

impl std::fmt::Debug for NotificationSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSubscriber")
            .field("registered", &self.is_registered())
            .finish()
    }
}
