//! HCI relay between the agent and the local controller.
//!
//! Inbound: each frame the agent sends is handed to the controller and the
//! result goes back as an `HciDataError` packet (code 0 on success).
//! Outbound: each event the controller raises goes to the agent as `HciData`.
//!
//! Both directions produce a comm-log line of the form
//! `"{FrameType}: {hex} {result}"`.

use std::fmt;

use tracing::{debug, warn};
use vhci_core::domain::platform_error::ERROR_INVALID_HANDLE;
use vhci_core::protocol::messages::STATUS_SUCCESS;
use vhci_core::{to_hex, CommandPacket, HciFrameType};

use crate::application::hardware::{DeviceHandle, HardwareRuntime};

/// Result of handing one frame to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed { code: u32, message: String },
}

impl Delivery {
    /// Platform code reported back to the agent.
    pub fn code(&self) -> u32 {
        match self {
            Delivery::Delivered => STATUS_SUCCESS,
            Delivery::Failed { code, .. } => *code,
        }
    }

    /// The `HciDataError` packet answering the frame.
    pub fn reply(&self) -> CommandPacket {
        CommandPacket::hci_data_error(self.code())
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Delivered => f.write_str("OK"),
            Delivery::Failed { code, message } => write!(f, "Fail: {code} ({message})"),
        }
    }
}

/// Hands `frame` to the controller behind `handle`.
///
/// Without a handle no call is made and the result is
/// `ERROR_INVALID_HANDLE`, the same code the runtime reports for a stale id.
pub fn deliver_frame(
    hardware: &dyn HardwareRuntime,
    handle: Option<DeviceHandle>,
    frame: &[u8],
) -> Delivery {
    let result = match handle {
        Some(handle) => hardware.send_frame(handle, frame).map_err(|e| e.code),
        None => Err(ERROR_INVALID_HANDLE),
    };
    match result {
        Ok(()) => {
            debug!("delivered {}-byte {} frame", frame.len(), HciFrameType::of_frame(frame));
            Delivery::Delivered
        }
        Err(code) => {
            let message = hardware.describe_error(code);
            warn!("frame delivery failed: {code} ({message})");
            Delivery::Failed { code, message }
        }
    }
}

/// Comm-log line for a frame received from the agent.
pub fn inbound_log_line(frame: &[u8], delivery: &Delivery) -> String {
    format!("{}: {} {}", HciFrameType::of_frame(frame), to_hex(frame), delivery)
}

/// Comm-log line for an event forwarded to the agent.
pub fn event_log_line(frame: &[u8]) -> String {
    format!("{}: {} OK", HciFrameType::Event, to_hex(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hardware::{MockHardwareRuntime, PlatformError};
    use mockall::predicate::{always, eq};

    #[test]
    fn test_successful_delivery_passes_exact_frame() {
        // Arrange
        let frame = vec![0x01, 0x03, 0x0c, 0x00];
        let expected = frame.clone();
        let mut mock = MockHardwareRuntime::new();
        mock.expect_send_frame()
            .withf(move |handle, sent| *handle == DeviceHandle(1) && sent == expected.as_slice())
            .times(1)
            .returning(|_, _| Ok(()));

        // Act
        let delivery = deliver_frame(&mock, Some(DeviceHandle(1)), &frame);

        // Assert
        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(delivery.reply(), CommandPacket::hci_data_error(0));
    }

    #[test]
    fn test_failed_delivery_reports_platform_code() {
        let mut mock = MockHardwareRuntime::new();
        mock.expect_send_frame()
            .returning(|_, _| Err(PlatformError::new(31)));
        mock.expect_describe_error()
            .with(eq(31))
            .returning(vhci_core::platform_error_message);

        let delivery = deliver_frame(&mock, Some(DeviceHandle(1)), &[0x02, 0x01]);

        assert_eq!(delivery.code(), 31);
        assert_eq!(delivery.reply(), CommandPacket::hci_data_error(31));
        assert_eq!(
            delivery.to_string(),
            "Fail: 31 (A device attached to the system is not functioning.)"
        );
    }

    #[test]
    fn test_delivery_without_handle_reports_invalid_handle() {
        // Arrange – no device open, so send_frame must not be reached
        let mut mock = MockHardwareRuntime::new();
        mock.expect_send_frame().with(always(), always()).never();
        mock.expect_describe_error()
            .returning(vhci_core::platform_error_message);

        // Act
        let delivery = deliver_frame(&mock, None, &[0x01, 0x03, 0x0c, 0x00]);

        // Assert
        assert_eq!(delivery.code(), ERROR_INVALID_HANDLE);
    }

    #[test]
    fn test_inbound_log_line_names_frame_type() {
        let line = inbound_log_line(&[0x01, 0x03, 0x0c, 0x00], &Delivery::Delivered);
        assert_eq!(line, "CommandPacket: 01030c00 OK");
    }

    #[test]
    fn test_inbound_log_line_for_failure() {
        let delivery = Delivery::Failed {
            code: 6,
            message: "The handle is invalid.".to_string(),
        };
        assert_eq!(
            inbound_log_line(&[0x02, 0xff], &delivery),
            "AclDataPacket: 02ff Fail: 6 (The handle is invalid.)"
        );
    }

    #[test]
    fn test_event_log_line_is_always_event_packet() {
        assert_eq!(event_log_line(&[0x04, 0x0e, 0x01]), "EventPacket: 040e01 OK");
    }
}
