//! User-controlled logging switches.

use serde::{Deserialize, Serialize};

/// The three logging switches exposed to the user.
///
/// All default to `false`, which is also the state assumed when no settings
/// have been saved yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Asks the agent to produce its own device-side log
    /// (`LoggingOn` / `LoggingOff` messages).
    pub device_logging: bool,
    /// Enables the hardware runtime's desktop log file.
    pub desktop_logging: bool,
    /// Records relayed traffic in the in-memory communication log.
    pub comm_logging: bool,
}

impl LoggingConfig {
    /// Runtime log level matching the desktop switch: 255 when on, 0 when off.
    pub fn runtime_log_level(&self) -> u8 {
        if self.desktop_logging {
            u8::MAX
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_every_switch_off() {
        let config = LoggingConfig::default();
        assert!(!config.device_logging);
        assert!(!config.desktop_logging);
        assert!(!config.comm_logging);
    }

    #[test]
    fn test_runtime_log_level_follows_desktop_switch() {
        let mut config = LoggingConfig::default();
        assert_eq!(config.runtime_log_level(), 0);
        config.desktop_logging = true;
        assert_eq!(config.runtime_log_level(), 255);
    }
}
