//! Command packet types exchanged with the remote agent.
//!
//! A [`CommandPacket`] is the unit the transport carries: a command id
//! ([`PacketKind`]) followed by an ordered list of [`Parameter`]s.  The
//! [`PeerPacket`] enum is the typed view the engine dispatches on.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::ProtocolError;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Largest byte buffer a single `Bytes` parameter may carry.
///
/// Matches the agent's fixed packet buffer; frames longer than this can never
/// be delivered to the other side.
pub const MAX_BYTES_LEN: usize = 4 * 1024;

/// Size of the fixed packet header: command id (4) + parameter count (2).
pub const PACKET_HEADER_SIZE: usize = 6;

/// Wire tag of a `DWORD` parameter.
pub const TAG_DWORD: u8 = 0x01;

/// Wire tag of a `Bytes` parameter.
pub const TAG_BYTES: u8 = 0x02;

/// Platform code reported in `HciDataError` when a frame was accepted.
pub const STATUS_SUCCESS: u32 = 0;

// ── Packet kinds ──────────────────────────────────────────────────────────────

/// Command id of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PacketKind {
    /// An HCI frame travelling in either direction.
    HciData = 0,
    /// Result of delivering the agent's last frame to the local controller.
    HciDataError = 1,
    /// Handshake / liveness control message.
    Message = 2,
}

impl TryFrom<u32> for PacketKind {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PacketKind::HciData),
            1 => Ok(PacketKind::HciDataError),
            2 => Ok(PacketKind::Message),
            _ => Err(()),
        }
    }
}

// ── Message ids ───────────────────────────────────────────────────────────────

/// Control message carried as the single `DWORD` of a `Message` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum MessageId {
    Ack = 0,
    Ping = 1,
    Initialize = 2,
    Uninitialize = 3,
    LoggingOn = 4,
    LoggingOff = 5,
    ComOpen = 6,
    ComClose = 7,
}

impl MessageId {
    /// All message ids in wire order.
    pub const ALL: [MessageId; 8] = [
        MessageId::Ack,
        MessageId::Ping,
        MessageId::Initialize,
        MessageId::Uninitialize,
        MessageId::LoggingOn,
        MessageId::LoggingOff,
        MessageId::ComOpen,
        MessageId::ComClose,
    ];

    /// Returns `LoggingOn` or `LoggingOff` for the given device-logging flag.
    pub fn for_device_logging(enabled: bool) -> Self {
        if enabled {
            MessageId::LoggingOn
        } else {
            MessageId::LoggingOff
        }
    }

    /// Name used in the communication log.
    pub fn name(self) -> &'static str {
        match self {
            MessageId::Ack => "Ack",
            MessageId::Ping => "Ping",
            MessageId::Initialize => "Initialize",
            MessageId::Uninitialize => "Uninitialize",
            MessageId::LoggingOn => "LoggingOn",
            MessageId::LoggingOff => "LoggingOff",
            MessageId::ComOpen => "ComOpen",
            MessageId::ComClose => "ComClose",
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for MessageId {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        MessageId::ALL
            .into_iter()
            .find(|id| *id as u32 == value)
            .ok_or(())
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// One tagged value inside a [`CommandPacket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    /// 32-bit unsigned integer.
    Dword(u32),
    /// Length-prefixed byte buffer of at most [`MAX_BYTES_LEN`] bytes.
    Bytes(Vec<u8>),
}

impl Parameter {
    /// Returns the wire tag for this parameter kind.
    pub fn tag(&self) -> u8 {
        match self {
            Parameter::Dword(_) => TAG_DWORD,
            Parameter::Bytes(_) => TAG_BYTES,
        }
    }
}

// ── Command packet ────────────────────────────────────────────────────────────

/// A packet as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPacket {
    /// Identifies how the parameters are to be interpreted.
    pub kind: PacketKind,
    /// Ordered parameter list.
    pub parameters: Vec<Parameter>,
}

impl CommandPacket {
    /// Creates a packet with no parameters.
    pub fn new(kind: PacketKind) -> Self {
        Self {
            kind,
            parameters: Vec::new(),
        }
    }

    /// Builds a `Message` packet carrying `id`.
    pub fn message(id: MessageId) -> Self {
        Self::new(PacketKind::Message).with_dword(id as u32)
    }

    /// Builds an `HciData` packet carrying one frame.
    pub fn hci_data(frame: impl Into<Vec<u8>>) -> Self {
        Self::new(PacketKind::HciData).with_bytes(frame)
    }

    /// Builds an `HciDataError` packet carrying a platform code (0 = success).
    pub fn hci_data_error(code: u32) -> Self {
        Self::new(PacketKind::HciDataError).with_dword(code)
    }

    /// Appends a `DWORD` parameter.
    pub fn with_dword(mut self, value: u32) -> Self {
        self.parameters.push(Parameter::Dword(value));
        self
    }

    /// Appends a `Bytes` parameter.
    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.parameters.push(Parameter::Bytes(bytes.into()));
        self
    }

    /// Returns the first `DWORD` parameter, if any.
    pub fn first_dword(&self) -> Option<u32> {
        self.parameters.iter().find_map(|p| match p {
            Parameter::Dword(v) => Some(*v),
            Parameter::Bytes(_) => None,
        })
    }

    /// Iterates over every `Bytes` parameter, skipping `DWORD`s.
    pub fn byte_buffers(&self) -> impl Iterator<Item = &[u8]> {
        self.parameters.iter().filter_map(|p| match p {
            Parameter::Bytes(b) => Some(b.as_slice()),
            Parameter::Dword(_) => None,
        })
    }
}

// ── Typed view ────────────────────────────────────────────────────────────────

/// Interpreted form of a received [`CommandPacket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerPacket {
    /// One or more HCI frames for the local controller.
    HciData(Vec<Vec<u8>>),
    /// Delivery status for a previously relayed frame.
    HciDataError(u32),
    /// Control message.
    Message(MessageId),
}

impl TryFrom<&CommandPacket> for PeerPacket {
    type Error = ProtocolError;

    fn try_from(packet: &CommandPacket) -> Result<Self, Self::Error> {
        match packet.kind {
            PacketKind::HciData => Ok(PeerPacket::HciData(
                packet.byte_buffers().map(<[u8]>::to_vec).collect(),
            )),
            PacketKind::HciDataError => packet
                .first_dword()
                .map(PeerPacket::HciDataError)
                .ok_or_else(|| {
                    ProtocolError::MalformedPayload("HciDataError: missing DWORD".to_string())
                }),
            PacketKind::Message => {
                let raw = packet.first_dword().ok_or_else(|| {
                    ProtocolError::MalformedPayload("Message: missing DWORD".to_string())
                })?;
                MessageId::try_from(raw)
                    .map(PeerPacket::Message)
                    .map_err(|_| ProtocolError::MalformedPayload(format!("unknown message id: {raw}")))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
