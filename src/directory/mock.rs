//! Mock endpoint backend for testing without audio hardware.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::backend::{
    DataFlow, DefaultDeviceNotification, EndpointBackend, EndpointInfo, NotificationCallback,
    NotificationRegistration, Role,
};
use crate::EndpointError;

/// `HRESULT_FROM_WIN32(ERROR_NOT_FOUND)`, returned for unknown endpoint ids.
const E_NOT_FOUND: i32 = 0x8007_0490_u32 as i32;

type CallbackList = Arc<Mutex<Vec<(u64, NotificationCallback)>>>;

/// An in-memory [`EndpointBackend`].
///
/// This allows exercising the service, engine and subscriber without a real
/// audio subsystem, making it suitable for CI environments. Notifications can
/// be fired from any thread to simulate the OS callback thread.
///
/// # Example
///
/// ```
/// use comm_sync::{DataFlow, EndpointBackend, MockBackend, Role};
///
/// let mock = MockBackend::new()
///     .with_device("spk", "Speakers")
///     .with_device("hs", "Headset");
///
/// mock.set_default_endpoint("hs", Role::Communications).unwrap();
///
/// assert_eq!(mock.set_calls(), vec![("hs".to_string(), Role::Communications)]);
/// assert_eq!(
///     mock.default_endpoint(DataFlow::Render, Role::Communications).unwrap(),
///     Some("hs".to_string())
/// );
/// ```
pub struct MockBackend {
    devices: Mutex<Vec<EndpointInfo>>,
    defaults: Mutex<HashMap<Role, String>>,
    set_calls: Mutex<Vec<(String, Role)>>,
    set_failure: Mutex<Option<i32>>,
    enumeration_failure: Mutex<Option<EndpointError>>,
    registration_failure: Mutex<Option<EndpointError>>,
    unregistration_failure: Arc<Mutex<Option<EndpointError>>>,
    call_delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    callbacks: CallbackList,
    next_registration: AtomicU64,
}

impl MockBackend {
    /// Creates a mock with no devices and no defaults.
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
            defaults: Mutex::new(HashMap::new()),
            set_calls: Mutex::new(Vec::new()),
            set_failure: Mutex::new(None),
            enumeration_failure: Mutex::new(None),
            registration_failure: Mutex::new(None),
            unregistration_failure: Arc::new(Mutex::new(None)),
            call_delay: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_registration: AtomicU64::new(0),
        }
    }

    /// Adds an active render device with a friendly name.
    #[must_use]
    pub fn with_device(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.add_device(id, Some(name.into()));
        self
    }

    /// Adds an active render device whose name property cannot be read.
    #[must_use]
    pub fn with_unnamed_device(self, id: impl Into<String>) -> Self {
        self.add_device(id, None);
        self
    }

    /// Adds a device at runtime (simulates hot-plug).
    pub fn add_device(&self, id: impl Into<String>, friendly_name: Option<String>) {
        self.devices.lock().push(EndpointInfo {
            id: id.into(),
            friendly_name,
        });
    }

    /// Removes a device at runtime (simulates unplugging).
    pub fn remove_device(&self, id: &str) {
        self.devices.lock().retain(|d| d.id != id);
    }

    /// Sets the default endpoint for `role` without recording a set call.
    pub fn set_default(&self, role: Role, id: impl Into<String>) {
        self.defaults.lock().insert(role, id.into());
    }

    /// Makes every subsequent set call fail with `code`, or succeed with `None`.
    pub fn fail_set_default(&self, code: Option<i32>) {
        *self.set_failure.lock() = code;
    }

    /// Makes enumeration fail with `error`, or succeed with `None`.
    pub fn fail_enumeration(&self, error: Option<EndpointError>) {
        *self.enumeration_failure.lock() = error;
    }

    /// Makes callback registration fail with `error`, or succeed with `None`.
    pub fn fail_registration(&self, error: Option<EndpointError>) {
        *self.registration_failure.lock() = error;
    }

    /// Makes unregistering fail with `error`, or succeed with `None`.
    ///
    /// A refused unregistration leaves the callback in place, as the OS would.
    pub fn fail_unregistration(&self, error: Option<EndpointError>) {
        *self.unregistration_failure.lock() = error;
    }

    /// Delays every set call, to make overlapping execution observable.
    pub fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock() = delay;
    }

    /// Returns every set call made so far, in call order.
    pub fn set_calls(&self) -> Vec<(String, Role)> {
        self.set_calls.lock().clone()
    }

    /// Returns the largest number of set calls that were ever in flight at once.
    pub fn max_concurrent_set_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Returns `true` while at least one notification callback is registered.
    pub fn is_registered(&self) -> bool {
        !self.callbacks.lock().is_empty()
    }

    /// Delivers a default-device-changed notification on the calling thread.
    ///
    /// Every registered callback is invoked, mirroring the OS. Returns the
    /// number of callbacks that received it.
    pub fn fire_default_changed(&self, flow: DataFlow, role: Role, device_id: Option<&str>) -> usize {
        if flow == DataFlow::Render {
            if let Some(id) = device_id {
                self.set_default(role, id);
            }
        }

        // Invoke outside the lock so callbacks may re-enter the mock
        let callbacks: Vec<NotificationCallback> =
            self.callbacks.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for callback in &callbacks {
            callback(DefaultDeviceNotification {
                flow,
                role,
                device_id: device_id.map(str::to_string),
            });
        }
        callbacks.len()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointBackend for MockBackend {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn active_endpoints(&self, flow: DataFlow) -> Result<Vec<EndpointInfo>, EndpointError> {
        if let Some(err) = self.enumeration_failure.lock().clone() {
            return Err(err);
        }
        if flow == DataFlow::Capture {
            return Ok(Vec::new());
        }
        Ok(self.devices.lock().clone())
    }

    fn friendly_name(&self, id: &str) -> Result<Option<String>, EndpointError> {
        self.devices
            .lock()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.friendly_name.clone())
            .ok_or_else(|| EndpointError::os("GetDevice", E_NOT_FOUND))
    }

    fn default_endpoint(
        &self,
        flow: DataFlow,
        role: Role,
    ) -> Result<Option<String>, EndpointError> {
        if flow == DataFlow::Capture {
            return Ok(None);
        }
        Ok(self.defaults.lock().get(&role).cloned())
    }

    fn set_default_endpoint(&self, id: &str, role: Role) -> Result<(), EndpointError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.call_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.set_calls.lock().push((id.to_string(), role));
        let failure = *self.set_failure.lock();
        let result = match failure {
            Some(code) => Err(EndpointError::SetDefaultFailed { code }),
            None => {
                self.defaults.lock().insert(role, id.to_string());
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn register_default_device_callback(
        &self,
        callback: NotificationCallback,
    ) -> Result<Box<dyn NotificationRegistration>, EndpointError> {
        if let Some(err) = self.registration_failure.lock().clone() {
            return Err(err);
        }
        let key = self.next_registration.fetch_add(1, Ordering::SeqCst);
        self.callbacks.lock().push((key, callback));
        Ok(Box::new(MockRegistration {
            key,
            callbacks: Arc::clone(&self.callbacks),
            failure: Arc::clone(&self.unregistration_failure),
            active: true,
        }))
    }
}

struct MockRegistration {
    key: u64,
    callbacks: CallbackList,
    failure: Arc<Mutex<Option<EndpointError>>>,
    active: bool,
}

impl NotificationRegistration for MockRegistration {
    fn unregister(&mut self) -> Result<(), EndpointError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.callbacks.lock().retain(|(key, _)| *key != self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_default_updates_defaults() {
        let mock = MockBackend::new().with_device("a", "A");
        mock.set_default_endpoint("a", Role::Communications).unwrap();

        assert_eq!(
            mock.default_endpoint(DataFlow::Render, Role::Communications).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(mock.max_concurrent_set_calls(), 1);
    }

    #[test]
    fn test_set_default_failure_is_recorded() {
        let mock = MockBackend::new();
        mock.fail_set_default(Some(-5));

        let err = mock.set_default_endpoint("a", Role::Communications).unwrap_err();
        assert_eq!(err, EndpointError::SetDefaultFailed { code: -5 });
        assert_eq!(mock.set_calls().len(), 1);
        assert_eq!(
            mock.default_endpoint(DataFlow::Render, Role::Communications).unwrap(),
            None
        );
    }

    #[test]
    fn test_friendly_name_unknown_device() {
        let mock = MockBackend::new();
        let err = mock.friendly_name("missing").unwrap_err();
        assert_eq!(err.code(), Some(E_NOT_FOUND));
    }

    #[test]
    fn test_fire_reaches_registered_callbacks_until_unregistered() {
        let mock = MockBackend::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut registration = mock
            .register_default_device_callback(Arc::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert!(mock.is_registered());

        assert_eq!(mock.fire_default_changed(DataFlow::Render, Role::Console, Some("a")), 1);
        registration.unregister().unwrap();
        registration.unregister().unwrap();
        assert_eq!(mock.fire_default_changed(DataFlow::Render, Role::Console, Some("b")), 0);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!mock.is_registered());
    }

    #[test]
    fn test_unregistration_failure_keeps_callback() {
        let mock = MockBackend::new();
        let mut registration = mock.register_default_device_callback(Arc::new(|_| {})).unwrap();
        mock.fail_unregistration(Some(EndpointError::os("UnregisterEndpointNotificationCallback", -1)));

        assert!(registration.unregister().is_err());
        // Reported once; the handle is spent either way
        assert!(registration.unregister().is_ok());
        assert!(mock.is_registered());
    }

    #[test]
    fn test_registration_failure() {
        let mock = MockBackend::new();
        mock.fail_registration(Some(EndpointError::unsupported("register")));
        assert!(mock
            .register_default_device_callback(Arc::new(|_| {}))
            .is_err());
    }
}
