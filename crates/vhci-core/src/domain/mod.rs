//! Domain types describing the local Bluetooth controller.
//!
//! This module contains plain data with no infrastructure dependencies.
//!
//! # What belongs here? (for beginners)
//!
//! The domain is the innermost layer: values and rules that stay true no
//! matter how the controller is reached or how the session is displayed.
//! Nothing in here opens a device, spawns a task or touches a socket, so
//! every type can be built and tested on any platform.
//!
//! Outer layers (the manager's application and infrastructure modules)
//! depend on these types; the domain never depends on them.

/// Controller identity and the attachment state of a session.
pub mod device;

/// HCI frame type tags and their log names.
pub mod frame;

/// Compact hex rendering of byte buffers.
pub mod hex;

/// The three user-controlled logging switches.
pub mod logging;

/// Human-readable text for native platform error codes.
pub mod platform_error;
