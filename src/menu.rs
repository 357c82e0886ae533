//! Snapshot of everything a tray menu needs to render.

use crate::directory::DeviceEndpoint;
use crate::DomainEvent;

/// One device line in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDevice {
    /// The endpoint as enumerated for this snapshot.
    pub endpoint: DeviceEndpoint,
    /// Whether this endpoint is the live communications default.
    pub is_comm_default: bool,
}

/// A self-contained value describing one menu render.
///
/// The device list is captured once, and selections are resolved against that
/// same list, so a pick always carries the id the operator saw even if the
/// OS re-enumerates in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSnapshot {
    /// Toggle value at snapshot time.
    pub sync_enabled: bool,
    /// Live communications default at snapshot time.
    pub comm_device_id: Option<String>,
    /// Active render endpoints, in enumeration order.
    pub devices: Vec<MenuDevice>,
}

impl MenuSnapshot {
    pub(crate) fn new(
        sync_enabled: bool,
        comm_device_id: Option<String>,
        endpoints: Vec<DeviceEndpoint>,
    ) -> Self {
        let devices = endpoints
            .into_iter()
            .map(|endpoint| MenuDevice {
                is_comm_default: comm_device_id
                    .as_deref()
                    .is_some_and(|id| endpoint.matches(id)),
                endpoint,
            })
            .collect();
        Self {
            sync_enabled,
            comm_device_id,
            devices,
        }
    }

    /// Turns the pick at `index` into an id-carrying manual override.
    ///
    /// Returns `None` for an index outside this snapshot.
    #[must_use]
    pub fn select(&self, index: usize) -> Option<DomainEvent> {
        self.devices
            .get(index)
            .map(|device| DomainEvent::manual_set(device.endpoint.id.clone()))
    }

    /// Whether the device list should be presented as selectable.
    ///
    /// While sync is on, a manual pick lasts only until the next console
    /// change, so menus usually grey the list out. Submitted picks are honored
    /// regardless.
    #[must_use]
    pub fn devices_selectable(&self) -> bool {
        !self.sync_enabled
    }

    /// Returns `true` if no render endpoint was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(id: &str, name: &str) -> DeviceEndpoint {
        DeviceEndpoint {
            id: id.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_marks_comm_default_case_insensitive() {
        let snapshot = MenuSnapshot::new(
            true,
            Some("{X}.{HEADSET}".to_string()),
            vec![endpoint("{x}.{speakers}", "Speakers"), endpoint("{x}.{headset}", "Headset")],
        );

        assert!(!snapshot.devices[0].is_comm_default);
        assert!(snapshot.devices[1].is_comm_default);
    }

    #[test]
    fn test_select_carries_id() {
        let snapshot = MenuSnapshot::new(
            false,
            None,
            vec![endpoint("a", "A"), endpoint("b", "B")],
        );

        assert_eq!(snapshot.select(1), Some(DomainEvent::manual_set("b")));
        assert_eq!(snapshot.select(2), None);
    }

    #[test]
    fn test_selectable_hint_follows_toggle() {
        assert!(!MenuSnapshot::new(true, None, Vec::new()).devices_selectable());
        assert!(MenuSnapshot::new(false, None, Vec::new()).devices_selectable());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MenuSnapshot::new(true, None, Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.select(0), None);
    }
}
