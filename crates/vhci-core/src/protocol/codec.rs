//! Binary codec for encoding and decoding command packets.
//!
//! Wire format:
//! ```text
//! [command_id:4][param_count:2] then param_count × parameter
//!
//! parameter := [0x01][value:4]              DWORD
//!            | [0x02][len:4][bytes:len]     Bytes (len <= MAX_BYTES_LEN)
//! ```
//! All multi-byte integers are big-endian.

use thiserror::Error;
use tracing::trace;

use crate::protocol::messages::{
    CommandPacket, PacketKind, Parameter, MAX_BYTES_LEN, PACKET_HEADER_SIZE, TAG_BYTES, TAG_DWORD,
};

/// Errors that can occur during packet encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command id in the header is not a recognized value.
    #[error("unknown command id: {0}")]
    UnknownCommand(u32),

    /// A parameter carries a tag other than DWORD or Bytes.
    #[error("unknown parameter tag: 0x{0:02X}")]
    UnknownParameterTag(u8),

    /// A byte buffer exceeds [`MAX_BYTES_LEN`].
    #[error("byte buffer of {len} bytes exceeds the {max}-byte limit")]
    BytesTooLong { len: usize, max: usize },

    /// The packet carries more parameters than the count field can express.
    #[error("too many parameters: {0}")]
    TooManyParameters(usize),

    /// The payload could not be interpreted (missing or out-of-range field).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`CommandPacket`] into a byte vector.
///
/// # Errors
///
/// Returns [`ProtocolError::BytesTooLong`] if a byte buffer exceeds
/// [`MAX_BYTES_LEN`], or [`ProtocolError::TooManyParameters`] if the
/// parameter count does not fit in 16 bits.
///
/// # Examples
///
/// ```rust
/// use vhci_core::protocol::{decode_packet, encode_packet, CommandPacket, MessageId};
///
/// let packet = CommandPacket::message(MessageId::Ping);
/// let bytes = encode_packet(&packet).unwrap();
/// let (decoded, consumed) = decode_packet(&bytes).unwrap();
/// assert_eq!(decoded, packet);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_packet(packet: &CommandPacket) -> Result<Vec<u8>, ProtocolError> {
    let count = u16::try_from(packet.parameters.len())
        .map_err(|_| ProtocolError::TooManyParameters(packet.parameters.len()))?;

    let mut buf = Vec::with_capacity(PACKET_HEADER_SIZE + encoded_parameters_len(packet));
    buf.extend_from_slice(&(packet.kind as u32).to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());

    for parameter in &packet.parameters {
        encode_parameter(&mut buf, parameter)?;
    }
    Ok(buf)
}

/// Decodes one [`CommandPacket`] from the beginning of `bytes`.
///
/// Returns the decoded packet and the number of bytes consumed, so the
/// caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are truncated or carry an unknown
/// command id or parameter tag.
pub fn decode_packet(bytes: &[u8]) -> Result<(CommandPacket, usize), ProtocolError> {
    if bytes.len() < PACKET_HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: PACKET_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let command_id = read_u32(bytes, 0)?;
    let kind = PacketKind::try_from(command_id)
        .map_err(|_| ProtocolError::UnknownCommand(command_id))?;
    let count = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;

    let mut parameters = Vec::with_capacity(count.min(16));
    let mut off = PACKET_HEADER_SIZE;
    for _ in 0..count {
        let (parameter, next) = decode_parameter(bytes, off)?;
        parameters.push(parameter);
        off = next;
    }

    Ok((CommandPacket { kind, parameters }, off))
}

// ── Parameter encoding ────────────────────────────────────────────────────────

fn encoded_parameters_len(packet: &CommandPacket) -> usize {
    packet
        .parameters
        .iter()
        .map(|p| match p {
            Parameter::Dword(_) => 1 + 4,
            Parameter::Bytes(b) => 1 + 4 + b.len(),
        })
        .sum()
}

fn encode_parameter(buf: &mut Vec<u8>, parameter: &Parameter) -> Result<(), ProtocolError> {
    buf.push(parameter.tag());
    match parameter {
        Parameter::Dword(value) => buf.extend_from_slice(&value.to_be_bytes()),
        Parameter::Bytes(bytes) => {
            if bytes.len() > MAX_BYTES_LEN {
                return Err(ProtocolError::BytesTooLong {
                    len: bytes.len(),
                    max: MAX_BYTES_LEN,
                });
            }
            buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            buf.extend_from_slice(bytes);
        }
    }
    Ok(())
}

// ── Parameter decoding ────────────────────────────────────────────────────────

/// Decodes the parameter starting at `off`; returns it with the offset of the
/// byte after it.
fn decode_parameter(buf: &[u8], off: usize) -> Result<(Parameter, usize), ProtocolError> {
    require_len(buf, off + 1)?;
    match buf[off] {
        TAG_DWORD => {
            let value = read_u32(buf, off + 1)?;
            Ok((Parameter::Dword(value), off + 5))
        }
        TAG_BYTES => {
            let len = read_u32(buf, off + 1)? as usize;
            if len > MAX_BYTES_LEN {
                return Err(ProtocolError::BytesTooLong {
                    len,
                    max: MAX_BYTES_LEN,
                });
            }
            let start = off + 5;
            require_len(buf, start + len)?;
            Ok((Parameter::Bytes(buf[start..start + len].to_vec()), start + len))
        }
        other => {
            trace!("rejecting parameter with tag 0x{other:02X} at offset {off}");
            Err(ProtocolError::UnknownParameterTag(other))
        }
    }
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

fn read_u32(buf: &[u8], offset: usize) -> Result<u32, ProtocolError> {
    require_len(buf, offset + 4)?;
    Ok(u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
