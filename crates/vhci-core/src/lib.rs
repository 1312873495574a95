//! # vhci-core
//!
//! Shared library for the virtual HCI bridge containing the packet codec
//! spoken with the remote agent and the domain types describing the local
//! Bluetooth controller.
//!
//! This crate has zero dependencies on OS APIs, async runtimes, or sockets.
//!
//! # Architecture overview (for beginners)
//!
//! A Bluetooth *host* talks to its *controller* using HCI: small binary
//! frames whose first byte says what kind of frame it is (command, ACL data,
//! SCO data, event).  The bridge lets a host that lives inside a remote
//! process (the *agent*, e.g. an emulated handheld) drive a controller that
//! is attached to this machine.  Frames travel between the two sides wrapped
//! in *command packets*.
//!
//! - **`protocol`** – How command packets look on the wire.  A packet is a
//!   32-bit command id followed by a list of tagged parameters (a `DWORD` or a
//!   length-prefixed byte buffer).  Control traffic uses a single `DWORD`
//!   carrying a [`MessageId`].
//!
//! - **`domain`** – Plain data describing the controller (address, HCI/LMP
//!   versions, manufacturer), the attachment state, the three logging
//!   switches, HCI frame types, and helpers that render bytes and platform
//!   error codes as text.

pub mod domain;
pub mod protocol;

pub use domain::device::{DeviceInfo, HardwareState};
pub use domain::frame::HciFrameType;
pub use domain::hex::to_hex;
pub use domain::logging::LoggingConfig;
pub use domain::platform_error::platform_error_message;
pub use protocol::codec::{decode_packet, encode_packet, ProtocolError};
pub use protocol::messages::{CommandPacket, MessageId, PacketKind, Parameter, PeerPacket};
