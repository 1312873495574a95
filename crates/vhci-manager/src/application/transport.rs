//! Port to the packet channel connecting the engine with the agent.

use vhci_core::CommandPacket;

/// Whether the channel to the agent is currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Outbound side of the agent channel.
///
/// Inbound packets are pushed into the engine by whoever owns the channel
/// (see `SessionEngine::handle_packet` and `SessionEngine::receive_bytes`).
pub trait TransportChannel: Send + Sync {
    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Sends a packet to the agent.  Fire-and-forget; failures are the
    /// channel's concern.
    fn send(&self, packet: CommandPacket);
}
