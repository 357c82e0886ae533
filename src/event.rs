//! Domain events consumed by the synchronization engine.
//!
//! Every state mutation in the crate is driven by exactly one [`DomainEvent`].
//! Events are created where the change is detected (an OS notification or a
//! user action), pass through the command serializer, and are consumed once.

use std::fmt;

/// An immutable, self-contained request to the synchronization engine.
///
/// # Example
///
/// ```
/// use comm_sync::DomainEvent;
///
/// fn describe(event: &DomainEvent) -> String {
///     match event {
///         DomainEvent::DefaultConsoleDeviceChanged { device_id } => {
///             format!("console default is now {device_id}")
///         }
///         DomainEvent::ToggleSync => "toggle".to_string(),
///         DomainEvent::ManualSetCommDevice { device_id } => {
///             format!("user picked {device_id}")
///         }
///     }
/// }
///
/// let event = DomainEvent::manual_set("{0.0.0.00000000}.{abc}");
/// assert!(describe(&event).starts_with("user picked"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// The OS reported a new default endpoint for (render, console).
    DefaultConsoleDeviceChanged {
        /// Endpoint id of the new console default.
        device_id: String,
    },

    /// The operator flipped the automatic synchronization toggle.
    ToggleSync,

    /// The operator explicitly picked a communications device.
    ///
    /// Manual picks bypass the toggle: an explicit choice always wins.
    ManualSetCommDevice {
        /// Endpoint id captured when the selection was made.
        device_id: String,
    },
}

impl DomainEvent {
    /// Creates a console-default-changed event.
    pub fn console_changed(device_id: impl Into<String>) -> Self {
        Self::DefaultConsoleDeviceChanged {
            device_id: device_id.into(),
        }
    }

    /// Creates a manual communications-device pick.
    pub fn manual_set(device_id: impl Into<String>) -> Self {
        Self::ManualSetCommDevice {
            device_id: device_id.into(),
        }
    }

    /// Returns the device id carried by the event, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::DefaultConsoleDeviceChanged { device_id }
            | Self::ManualSetCommDevice { device_id } => Some(device_id),
            Self::ToggleSync => None,
        }
    }
}

impl fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultConsoleDeviceChanged { device_id } => {
                write!(f, "console default changed to {device_id}")
            }
            Self::ToggleSync => f.write_str("toggle sync"),
            Self::ManualSetCommDevice { device_id } => {
                write!(f, "manual communications pick {device_id}")
            }
        }
    }
}
