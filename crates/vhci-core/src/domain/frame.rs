//! HCI frame types.
//!
//! Byte 0 of every frame relayed between the agent and the controller names
//! its type.  The communication log labels each frame with that type.

use serde::{Deserialize, Serialize};

/// Type tag carried in the first byte of an HCI frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HciFrameType {
    Command,
    AclData,
    ScoData,
    Event,
    Finish,
    /// Any tag outside 1..=5, kept verbatim for logging.
    Unknown(u8),
}

impl HciFrameType {
    /// Classifies a frame by its first byte.  An empty frame is `Unknown(0)`.
    pub fn of_frame(frame: &[u8]) -> Self {
        frame.first().copied().map_or(HciFrameType::Unknown(0), Self::from_tag)
    }

    /// Maps a raw tag byte to a frame type.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => HciFrameType::Command,
            2 => HciFrameType::AclData,
            3 => HciFrameType::ScoData,
            4 => HciFrameType::Event,
            5 => HciFrameType::Finish,
            other => HciFrameType::Unknown(other),
        }
    }

    /// Returns the wire tag for this frame type.
    pub fn tag(self) -> u8 {
        match self {
            HciFrameType::Command => 1,
            HciFrameType::AclData => 2,
            HciFrameType::ScoData => 3,
            HciFrameType::Event => 4,
            HciFrameType::Finish => 5,
            HciFrameType::Unknown(tag) => tag,
        }
    }

    /// Name used as the prefix of a communication log line.
    pub fn log_name(self) -> String {
        match self {
            HciFrameType::Command => "CommandPacket".to_string(),
            HciFrameType::AclData => "AclDataPacket".to_string(),
            HciFrameType::ScoData => "ScoDataPacket".to_string(),
            HciFrameType::Event => "EventPacket".to_string(),
            HciFrameType::Finish => "FinishPacket".to_string(),
            HciFrameType::Unknown(tag) => format!("Unknown(0x{tag:02X})"),
        }
    }
}

impl std::fmt::Display for HciFrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.log_name())
    }
}
