//! Controller identity and session attachment state.

use serde::{Deserialize, Serialize};

/// Attachment state of the virtual controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareState {
    /// No device is open.  The initial state and the state after a detach.
    #[default]
    Detached,
    /// A device handle is held and traffic is relayed.
    Attached,
    /// The last attach attempt failed; the session carries the error.
    Unavailable,
}

impl std::fmt::Display for HardwareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HardwareState::Detached => "Detached",
            HardwareState::Attached => "Attached",
            HardwareState::Unavailable => "Unavailable",
        };
        f.write_str(name)
    }
}

/// Identity reported by the local Bluetooth controller.
///
/// The address is stored least-significant byte first, exactly as the
/// controller returns it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Bluetooth device address, least-significant byte first.
    pub address: [u8; 6],
    pub hci_version: u8,
    pub hci_revision: u16,
    pub lmp_version: u8,
    pub lmp_subversion: u16,
    /// Bluetooth SIG company identifier.
    pub manufacturer: u16,
}

impl DeviceInfo {
    /// Renders the address as `AA:BB:CC:DD:EE:FF`, most-significant byte first.
    pub fn address_string(&self) -> String {
        self.address
            .iter()
            .rev()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Renders the HCI version and revision as `"{version}.{revision:02}"`.
    pub fn hci_version_string(&self) -> String {
        format!("{}.{:02}", self.hci_version, self.hci_revision)
    }

    /// Renders the LMP version and subversion as `"{version}.{subversion:02}"`.
    pub fn lmp_version_string(&self) -> String {
        format!("{}.{:02}", self.lmp_version, self.lmp_subversion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> DeviceInfo {
        DeviceInfo {
            address: [0x66, 0x55, 0x44, 0x33, 0x22, 0x11],
            hci_version: 9,
            hci_revision: 3,
            lmp_version: 9,
            lmp_subversion: 0x2a,
            manufacturer: 0x000f,
        }
    }

    #[test]
    fn test_address_string_reverses_storage_order() {
        assert_eq!(sample_info().address_string(), "11:22:33:44:55:66");
    }

    #[test]
    fn test_version_strings_pad_minor_part() {
        let info = sample_info();
        assert_eq!(info.hci_version_string(), "9.03");
        assert_eq!(info.lmp_version_string(), "9.42");
    }

    #[test]
    fn test_default_state_is_detached() {
        assert_eq!(HardwareState::default(), HardwareState::Detached);
    }
}
