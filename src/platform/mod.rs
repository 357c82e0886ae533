//! Platform-specific endpoint backends.

mod cpal_backend;
#[cfg(windows)]
pub mod wasapi;

pub use cpal_backend::CpalBackend;

use std::sync::Arc;

use crate::directory::EndpointBackend;
use crate::CommSyncError;

/// Creates the endpoint backend for the current platform.
///
/// On Windows this is the WASAPI/policy-config backend with full control. On
/// other platforms it is the read-only CPAL backend.
///
/// # Errors
///
/// Returns `ComInit` or `BackendUnavailable` if the Windows audio subsystem
/// cannot be reached.
#[cfg(windows)]
pub fn default_backend() -> Result<Arc<dyn EndpointBackend>, CommSyncError> {
    Ok(Arc::new(wasapi::WasapiBackend::new()?))
}

/// Creates the endpoint backend for the current platform.
///
/// On Windows this is the WASAPI/policy-config backend with full control. On
/// other platforms it is the read-only CPAL backend.
///
/// # Errors
///
/// Never fails on this platform.
#[cfg(not(windows))]
pub fn default_backend() -> Result<Arc<dyn EndpointBackend>, CommSyncError> {
    Ok(Arc::new(CpalBackend::new()))
}
