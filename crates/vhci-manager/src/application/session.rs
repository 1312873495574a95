//! Session state controller: attaching and detaching the virtual controller.
//!
//! A [`Session`] holds everything a view shows about the controller.  Its
//! state and handle always agree: a handle is present exactly when the state
//! is [`HardwareState::Attached`].

use serde::Serialize;
use tracing::{info, warn};
use vhci_core::{DeviceInfo, HardwareState, LoggingConfig};

use crate::application::hardware::{DeviceHandle, HardwareRuntime};

/// Result of [`Session::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The device was opened; the caller must subscribe events and start the
    /// watchdog for this handle.
    Attached(DeviceHandle),
    /// A device was already open; nothing was done.
    AlreadyAttached,
    /// Opening failed; the session is now `Unavailable`.
    Failed { code: u32 },
}

/// Attachment state of the controller as seen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub state: HardwareState,
    pub device_handle: Option<DeviceHandle>,
    /// Platform code of the last failed attach, 0 if none.
    pub last_error_code: u32,
    pub last_error_message: String,
    pub device_info: DeviceInfo,
    pub manufacturer_name: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: HardwareState::Detached,
            device_handle: None,
            last_error_code: 0,
            last_error_message: String::new(),
            device_info: DeviceInfo::default(),
            manufacturer_name: String::new(),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.state == HardwareState::Attached
    }

    /// Handle of the open device, `None` unless attached.
    pub fn handle(&self) -> Option<DeviceHandle> {
        self.device_handle
    }

    /// Opens the device through `hardware`.
    ///
    /// The runtime's diagnostic log file and level are configured before the
    /// open call so the open itself is covered by the runtime log.  A failure
    /// to read the device identity is not fatal; the previous identity is
    /// kept.
    pub fn attach(
        &mut self,
        hardware: &dyn HardwareRuntime,
        runtime_log_file: &str,
        logging: &LoggingConfig,
    ) -> AttachOutcome {
        if self.is_attached() {
            return AttachOutcome::AlreadyAttached;
        }

        hardware.set_log_file_name(runtime_log_file);
        hardware.set_log_level(logging.runtime_log_level());

        match hardware.open() {
            Ok(handle) => {
                self.state = HardwareState::Attached;
                self.device_handle = Some(handle);
                match hardware.device_info(handle) {
                    Ok(info) => self.device_info = info,
                    Err(e) => warn!("could not read device info for {handle}: {e}"),
                }
                self.manufacturer_name = hardware.manufacturer_name(self.device_info.manufacturer);
                info!(
                    "attached {handle}: {} ({})",
                    self.device_info.address_string(),
                    self.manufacturer_name
                );
                AttachOutcome::Attached(handle)
            }
            Err(e) => {
                self.state = HardwareState::Unavailable;
                self.device_handle = None;
                self.last_error_code = e.code;
                self.last_error_message = hardware.describe_error(e.code);
                warn!("attach failed: {} ({})", e.code, self.last_error_message);
                AttachOutcome::Failed { code: e.code }
            }
        }
    }

    /// Stops event delivery for the open device, leaving it attached so
    /// events already queued can still be applied.
    ///
    /// Returns the handle, or `None` when nothing is attached.
    pub fn stop_events(&self, hardware: &dyn HardwareRuntime) -> Option<DeviceHandle> {
        if !self.is_attached() {
            return None;
        }
        let handle = self.device_handle?;
        hardware.unsubscribe_events(handle);
        Some(handle)
    }

    /// Closes the device and moves to `Detached`.  Call
    /// [`Session::stop_events`] first.
    ///
    /// Returns the released handle, or `None` when nothing was attached (in
    /// which case the session is left untouched).
    pub fn detach(&mut self, hardware: &dyn HardwareRuntime) -> Option<DeviceHandle> {
        if !self.is_attached() {
            return None;
        }
        let handle = self.device_handle.take()?;
        hardware.close(handle);
        self.state = HardwareState::Detached;
        info!("detached {handle}");
        Some(handle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
