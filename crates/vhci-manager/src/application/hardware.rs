//! Port to the native controller runtime.
//!
//! The engine never talks to a driver directly.  It drives a
//! [`HardwareRuntime`] implementation, which the infrastructure layer
//! provides (a simulated runtime ships with the crate; a native one would
//! wrap the platform driver API).

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::warn;
use vhci_core::{platform_error_message, DeviceInfo};

/// Opaque identifier of an open device, issued by [`HardwareRuntime::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceHandle(pub u64);

impl std::fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure reported by the runtime, carrying the native platform code.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("platform error {code}")]
pub struct PlatformError {
    pub code: u32,
}

impl PlatformError {
    pub fn new(code: u32) -> Self {
        Self { code }
    }
}

/// An HCI event frame raised by the controller for a given handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareEvent {
    pub handle: DeviceHandle,
    pub frame: Vec<u8>,
}

/// Delivery end handed to the runtime when events are subscribed.
///
/// The runtime calls [`HciEventSink::deliver`] from its own callback thread.
/// Delivery never blocks: when the engine's queue is full the frame is
/// dropped.  Every queued frame signals `ready` so the engine wakes up.
#[derive(Debug, Clone)]
pub struct HciEventSink {
    handle: DeviceHandle,
    tx: mpsc::Sender<HardwareEvent>,
    ready: Arc<Notify>,
}

impl HciEventSink {
    pub fn new(handle: DeviceHandle, tx: mpsc::Sender<HardwareEvent>, ready: Arc<Notify>) -> Self {
        Self { handle, tx, ready }
    }

    /// Handle this sink was bound to at subscription time.
    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Queues `frame` for the engine.  Returns `false` if it was dropped.
    pub fn deliver(&self, frame: &[u8]) -> bool {
        match self.tx.try_send(HardwareEvent {
            handle: self.handle,
            frame: frame.to_vec(),
        }) {
            Ok(()) => {
                self.ready.notify_one();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("event queue full, dropping {}-byte frame for {}", frame.len(), self.handle);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Operations the engine needs from the controller runtime.
///
/// Calls are synchronous and expected to return promptly; the engine holds
/// its state lock while making them.
#[cfg_attr(test, mockall::automock)]
pub trait HardwareRuntime: Send + Sync {
    /// Opens the virtual controller.
    fn open(&self) -> Result<DeviceHandle, PlatformError>;

    /// Releases a handle returned by [`HardwareRuntime::open`].
    fn close(&self, handle: DeviceHandle);

    /// Hands one HCI frame to the controller.
    fn send_frame(&self, handle: DeviceHandle, frame: &[u8]) -> Result<(), PlatformError>;

    /// Reads the controller's identity.
    fn device_info(&self, handle: DeviceHandle) -> Result<DeviceInfo, PlatformError>;

    /// Resolves a Bluetooth SIG company identifier to a display name.
    fn manufacturer_name(&self, manufacturer: u16) -> String;

    /// Starts delivering controller events for `handle` to `sink`.
    fn subscribe_events(&self, handle: DeviceHandle, sink: HciEventSink);

    /// Stops event delivery for `handle`.
    fn unsubscribe_events(&self, handle: DeviceHandle);

    /// Sets the runtime's own diagnostic log level (0 = off, 255 = everything).
    fn set_log_level(&self, level: u8);

    /// Sets the file the runtime writes its diagnostic log to.
    fn set_log_file_name(&self, name: &str);

    /// Human-readable text for a platform error code.
    fn describe_error(&self, code: u32) -> String {
        platform_error_message(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_delivers_frame_tagged_with_handle() {
        // Arrange
        let (tx, mut rx) = mpsc::channel(4);
        let ready = Arc::new(Notify::new());
        let sink = HciEventSink::new(DeviceHandle(7), tx, Arc::clone(&ready));

        // Act
        let accepted = sink.deliver(&[0x04, 0x0e]);

        // Assert – the stored permit completes the wait immediately
        assert!(accepted);
        ready.notified().await;
        let event = rx.try_recv().unwrap();
        assert_eq!(event.handle, DeviceHandle(7));
        assert_eq!(event.frame, vec![0x04, 0x0e]);
    }

    #[test]
    fn test_sink_drops_frame_when_queue_is_full() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = HciEventSink::new(DeviceHandle(1), tx, Arc::default());
        assert!(sink.deliver(&[0x04]));
        assert!(!sink.deliver(&[0x04]));
    }

    #[test]
    fn test_sink_reports_drop_when_engine_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = HciEventSink::new(DeviceHandle(1), tx, Arc::default());
        assert!(!sink.deliver(&[0x04]));
    }

    #[test]
    fn test_platform_error_display_includes_code() {
        assert_eq!(PlatformError::new(31).to_string(), "platform error 31");
    }
}
