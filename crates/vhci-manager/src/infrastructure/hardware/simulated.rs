//! Simulated controller runtime.
//!
//! # Why a simulated runtime?
//!
//! A real virtual-HCI driver needs kernel support, elevated rights and an
//! actual Bluetooth stack on the other side.  `SimulatedHardware` replaces
//! all of that with in-memory recording so that:
//!
//! - Tests can assert exactly which frames reached the controller, which
//!   handles were opened, subscribed and closed, and in what order.
//! - Failures can be injected per operation with a platform code.
//! - Controller events can be raised on demand with [`SimulatedHardware::inject_event`].
//! - The binary can run end-to-end without a driver installed.
//!
//! With `answer_commands` switched on, every HCI command frame is answered
//! with a Command Complete event carrying status 0, which is enough to keep
//! a host stack's initialisation sequence moving.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;
use vhci_core::{DeviceInfo, HciFrameType};

use crate::application::hardware::{DeviceHandle, HardwareRuntime, HciEventSink, PlatformError};

/// HCI event code of Command Complete.
const EVT_COMMAND_COMPLETE: u8 = 0x0e;

/// Failures to inject, as platform codes.  `None` means the call succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailurePlan {
    pub open: Option<u32>,
    pub send_frame: Option<u32>,
    pub device_info: Option<u32>,
}

/// An in-memory controller runtime that records every call.
#[derive(Debug)]
pub struct SimulatedHardware {
    /// Identity returned by `device_info`.
    pub info: DeviceInfo,
    /// Answers every command frame with a Command Complete event.
    pub answer_commands: bool,
    /// Injected failures; may be changed between calls.
    pub failures: Mutex<FailurePlan>,
    /// Handles returned by `open`, in order.
    pub opened: Mutex<Vec<DeviceHandle>>,
    /// Handles passed to `close`, in order.
    pub closed: Mutex<Vec<DeviceHandle>>,
    /// Every (handle, frame) pair accepted by `send_frame`.
    pub sent_frames: Mutex<Vec<(DeviceHandle, Vec<u8>)>>,
    /// Handles passed to `subscribe_events`, in order.
    pub subscribed: Mutex<Vec<DeviceHandle>>,
    /// Handles passed to `unsubscribe_events`, in order.
    pub unsubscribed: Mutex<Vec<DeviceHandle>>,
    /// Values passed to `set_log_level`.
    pub log_levels: Mutex<Vec<u8>>,
    /// Values passed to `set_log_file_name`.
    pub log_file_names: Mutex<Vec<String>>,
    sink: Mutex<Option<HciEventSink>>,
    next_handle: AtomicU64,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self {
            info: default_device_info(),
            answer_commands: false,
            failures: Mutex::new(FailurePlan::default()),
            opened: Mutex::default(),
            closed: Mutex::default(),
            sent_frames: Mutex::default(),
            subscribed: Mutex::default(),
            unsubscribed: Mutex::default(),
            log_levels: Mutex::default(),
            log_file_names: Mutex::default(),
            sink: Mutex::new(None),
            next_handle: AtomicU64::new(1),
        }
    }
}

/// Identity of a Bluetooth 4.0 Broadcom controller.
fn default_device_info() -> DeviceInfo {
    DeviceInfo {
        address: [0x5e, 0x4d, 0x3c, 0x2b, 0x1a, 0x00],
        hci_version: 6,
        hci_revision: 0x1000,
        lmp_version: 6,
        lmp_subversion: 0x220e,
        manufacturer: 0x000f,
    }
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime that answers every HCI command with Command Complete.
    pub fn answering_commands() -> Self {
        Self {
            answer_commands: true,
            ..Self::default()
        }
    }

    /// A runtime whose `open` always fails with `code`.
    pub fn failing_open(code: u32) -> Self {
        let hardware = Self::default();
        lock(&hardware.failures).open = Some(code);
        hardware
    }

    /// Replaces the injected failures.
    pub fn set_failures(&self, plan: FailurePlan) {
        *lock(&self.failures) = plan;
    }

    /// Raises a controller event through the current subscription.
    ///
    /// Returns `false` when nothing is subscribed or the engine dropped it.
    pub fn inject_event(&self, frame: &[u8]) -> bool {
        lock(&self.sink)
            .as_ref()
            .is_some_and(|sink| sink.deliver(frame))
    }

    /// Raises an event as if it came from `handle`, even a stale one.
    pub fn inject_event_for(&self, handle: DeviceHandle, frame: &[u8]) -> bool {
        let sink = lock(&self.sink).clone();
        match sink {
            Some(sink) if sink.handle() == handle => sink.deliver(frame),
            _ => false,
        }
    }

    /// Whether an event subscription is active.
    pub fn is_subscribed(&self) -> bool {
        lock(&self.sink).is_some()
    }

    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        lock(&self.sent_frames)
            .iter()
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    fn answer(&self, frame: &[u8]) {
        if !self.answer_commands || HciFrameType::of_frame(frame) != HciFrameType::Command {
            return;
        }
        // Command frame: [0x01][opcode lo][opcode hi][len] ...
        let (Some(&lo), Some(&hi)) = (frame.get(1), frame.get(2)) else {
            return;
        };
        let event = [HciFrameType::Event.tag(), EVT_COMMAND_COMPLETE, 4, 1, lo, hi, 0];
        if !self.inject_event(&event) {
            debug!("no subscriber for Command Complete of opcode 0x{hi:02x}{lo:02x}");
        }
    }
}

impl HardwareRuntime for SimulatedHardware {
    fn open(&self) -> Result<DeviceHandle, PlatformError> {
        if let Some(code) = lock(&self.failures).open {
            return Err(PlatformError::new(code));
        }
        let handle = DeviceHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        lock(&self.opened).push(handle);
        Ok(handle)
    }

    fn close(&self, handle: DeviceHandle) {
        lock(&self.closed).push(handle);
    }

    fn send_frame(&self, handle: DeviceHandle, frame: &[u8]) -> Result<(), PlatformError> {
        if let Some(code) = lock(&self.failures).send_frame {
            return Err(PlatformError::new(code));
        }
        lock(&self.sent_frames).push((handle, frame.to_vec()));
        self.answer(frame);
        Ok(())
    }

    fn device_info(&self, _handle: DeviceHandle) -> Result<DeviceInfo, PlatformError> {
        match lock(&self.failures).device_info {
            Some(code) => Err(PlatformError::new(code)),
            None => Ok(self.info),
        }
    }

    fn manufacturer_name(&self, manufacturer: u16) -> String {
        company_name(manufacturer)
    }

    fn subscribe_events(&self, handle: DeviceHandle, sink: HciEventSink) {
        lock(&self.subscribed).push(handle);
        *lock(&self.sink) = Some(sink);
    }

    fn unsubscribe_events(&self, handle: DeviceHandle) {
        lock(&self.unsubscribed).push(handle);
        let mut sink = lock(&self.sink);
        if sink.as_ref().is_some_and(|s| s.handle() == handle) {
            *sink = None;
        }
    }

    fn set_log_level(&self, level: u8) {
        lock(&self.log_levels).push(level);
    }

    fn set_log_file_name(&self, name: &str) {
        lock(&self.log_file_names).push(name.to_string());
    }
}

/// Bluetooth SIG company names for a handful of common controller vendors.
fn company_name(manufacturer: u16) -> String {
    let name = match manufacturer {
        0x0000 => "Ericsson Technology Licensing",
        0x0002 => "Intel Corp.",
        0x000a => "Qualcomm Technologies International, Ltd. (QTIL)",
        0x000d => "Texas Instruments Inc.",
        0x000f => "Broadcom Corporation",
        0x001d => "Qualcomm",
        0x005d => "Realtek Semiconductor Corporation",
        0x0131 => "Cypress Semiconductor",
        other => return format!("Unknown (0x{other:04x})"),
    };
    name.to_string()
}

/// Recording locks survive a panicking test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_open_issues_distinct_handles() {
        let hardware = SimulatedHardware::new();
        let a = hardware.open().unwrap();
        let b = hardware.open().unwrap();
        assert_ne!(a, b);
        assert_eq!(*hardware.opened.lock().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_failing_open_returns_code() {
        let hardware = SimulatedHardware::failing_open(5);
        assert_eq!(hardware.open(), Err(PlatformError::new(5)));
        assert!(hardware.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_send_frame_failure_is_not_recorded() {
        let hardware = SimulatedHardware::new();
        hardware.set_failures(FailurePlan {
            send_frame: Some(31),
            ..FailurePlan::default()
        });

        let result = hardware.send_frame(DeviceHandle(1), &[0x01, 0x03, 0x0c, 0x00]);

        assert_eq!(result, Err(PlatformError::new(31)));
        assert!(hardware.sent_frames().is_empty());
    }

    #[tokio::test]
    async fn test_command_is_answered_with_command_complete() {
        // Arrange
        let hardware = SimulatedHardware::answering_commands();
        let (tx, mut rx) = mpsc::channel(4);
        let sink = HciEventSink::new(DeviceHandle(1), tx, Default::default());
        hardware.subscribe_events(DeviceHandle(1), sink);

        // Act – HCI_Reset, opcode 0x0c03
        hardware
            .send_frame(DeviceHandle(1), &[0x01, 0x03, 0x0c, 0x00])
            .unwrap();

        // Assert
        let event = rx.recv().await.unwrap();
        assert_eq!(event.frame, vec![0x04, 0x0e, 0x04, 0x01, 0x03, 0x0c, 0x00]);
    }

    #[test]
    fn test_unsubscribe_stops_injection() {
        let hardware = SimulatedHardware::new();
        let (tx, _rx) = mpsc::channel(4);
        let sink = HciEventSink::new(DeviceHandle(2), tx, Default::default());
        hardware.subscribe_events(DeviceHandle(2), sink);

        hardware.unsubscribe_events(DeviceHandle(2));

        assert!(!hardware.is_subscribed());
        assert!(!hardware.inject_event(&[0x04, 0x05]));
    }

    #[test]
    fn test_unknown_company_renders_code() {
        assert_eq!(company_name(0x000f), "Broadcom Corporation");
        assert_eq!(company_name(0xbeef), "Unknown (0xbeef)");
    }
}
