//! Synchronization engine: business rules applied to each [`DomainEvent`].
//!
//! | `sync_enabled` | event                         | action                                   |
//! |----------------|-------------------------------|------------------------------------------|
//! | true           | `DefaultConsoleDeviceChanged` | set communications default, log result   |
//! | false          | `DefaultConsoleDeviceChanged` | log the console change only              |
//! | any            | `ToggleSync`                  | flip the toggle, log new state           |
//! | any            | `ManualSetCommDevice`         | set communications default, log result   |
//!
//! The engine is plain synchronous code. It owns [`RoutingState`] and is only
//! ever driven by the command serializer, one event at a time.

use std::sync::Arc;

use crate::directory::{DeviceDirectory, EndpointBackend, Role};
use crate::sink::LogSinks;
use crate::{DomainEvent, EndpointError, SyncConfig};

/// The sole mutable state of the sync core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingState {
    /// Operator toggle for automatic synchronization.
    pub sync_enabled: bool,
    /// Endpoint most recently pushed as communications default by this process.
    ///
    /// The OS value can change out-of-band, so this is informational only and
    /// never suppresses a re-apply.
    pub last_applied_comm_device_id: Option<String>,
}

impl Default for RoutingState {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            last_applied_comm_device_id: None,
        }
    }
}

/// What the engine did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The communications default was set to `device_id`.
    Applied {
        /// Endpoint now holding the communications role.
        device_id: String,
    },
    /// The console change was observed while sync was disabled.
    Skipped,
    /// The toggle was flipped.
    Toggled {
        /// New toggle value.
        enabled: bool,
    },
    /// The OS rejected the set call; state is unchanged.
    Failed {
        /// Endpoint that was requested.
        device_id: String,
        /// Why the call failed.
        error: EndpointError,
    },
}

pub(crate) struct SyncEngine {
    state: RoutingState,
    backend: Arc<dyn EndpointBackend>,
    directory: DeviceDirectory,
    log: LogSinks,
}

impl SyncEngine {
    pub fn new(backend: Arc<dyn EndpointBackend>, log: LogSinks, config: &SyncConfig) -> Self {
        Self {
            state: RoutingState {
                sync_enabled: config.sync_enabled,
                last_applied_comm_device_id: None,
            },
            directory: DeviceDirectory::new(Arc::clone(&backend)),
            backend,
            log,
        }
    }

    pub fn state(&self) -> &RoutingState {
        &self.state
    }

    pub fn log(&self, message: &str) {
        self.log.log(message);
    }

    /// Applies one event. Never fails: OS errors are logged and reported in the outcome.
    pub fn handle(&mut self, event: DomainEvent) -> SyncOutcome {
        match event {
            DomainEvent::DefaultConsoleDeviceChanged { device_id } => {
                self.on_console_changed(device_id)
            }
            DomainEvent::ToggleSync => self.on_toggle(),
            DomainEvent::ManualSetCommDevice { device_id } => self.on_manual_set(device_id),
        }
    }

    fn on_console_changed(&mut self, device_id: String) -> SyncOutcome {
        let name = self.directory.resolve_name(&device_id);
        self.log(&format!("Default output changed → {name}"));

        if !self.state.sync_enabled {
            self.log("Sync disabled, skipping communication device update");
            return SyncOutcome::Skipped;
        }

        match self.apply_comm_default(&device_id) {
            Ok(()) => {
                self.log(&format!("Synced communication device → {name}"));
                SyncOutcome::Applied { device_id }
            }
            Err(error) => {
                self.log(&error.to_string());
                SyncOutcome::Failed { device_id, error }
            }
        }
    }

    fn on_toggle(&mut self) -> SyncOutcome {
        self.state.sync_enabled = !self.state.sync_enabled;
        let enabled = self.state.sync_enabled;
        self.log(if enabled { "Sync enabled" } else { "Sync disabled" });
        SyncOutcome::Toggled { enabled }
    }

    fn on_manual_set(&mut self, device_id: String) -> SyncOutcome {
        match self.apply_comm_default(&device_id) {
            Ok(()) => {
                let name = self.directory.resolve_name(&device_id);
                self.log(&format!("Manually set communication device → {name}"));
                SyncOutcome::Applied { device_id }
            }
            Err(error) => {
                let detail = match error.code() {
                    Some(code) => format!("HRESULT 0x{code:08X}"),
                    None => error.to_string(),
                };
                self.log(&format!("Failed to set communication device ({detail})"));
                SyncOutcome::Failed { device_id, error }
            }
        }
    }

    fn apply_comm_default(&mut self, device_id: &str) -> Result<(), EndpointError> {
        match self
            .backend
            .set_default_endpoint(device_id, Role::Communications)
        {
            Ok(()) => {
                tracing::debug!(
                    device_id,
                    previous = ?self.state.last_applied_comm_device_id,
                    "communications default applied"
                );
                self.state.last_applied_comm_device_id = Some(device_id.to_string());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(device_id, error = %e, code = ?e.code(), "communications default not applied");
                Err(e)
            }
        }
    }
}
