//! In-process agent channel.
//!
//! `ChannelTransport` hands every outbound packet to an unbounded Tokio
//! channel.  The receiving end plays the agent: in tests it is drained and
//! inspected, in the binary it feeds a loopback agent.  The connection state
//! is a switch the owner flips to simulate the agent going away.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::debug;
use vhci_core::CommandPacket;

use crate::application::transport::{ConnectionState, TransportChannel};

/// Transport backed by an in-process channel.
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<CommandPacket>,
    connected: AtomicBool,
    sent: AtomicU64,
}

impl ChannelTransport {
    /// Creates a connected transport and the receiver for its packets.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CommandPacket>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound,
                connected: AtomicBool::new(true),
                sent: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Flips the reported connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of packets handed to the channel so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl TransportChannel for ChannelTransport {
    fn connection_state(&self) -> ConnectionState {
        if self.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn send(&self, packet: CommandPacket) {
        if self.outbound.send(packet).is_err() {
            debug!("agent side of the channel is closed");
            return;
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vhci_core::MessageId;

    #[test]
    fn test_new_transport_is_connected() {
        let (transport, _rx) = ChannelTransport::new();
        assert_eq!(transport.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn test_set_connected_false_reports_disconnected() {
        let (transport, _rx) = ChannelTransport::new();
        transport.set_connected(false);
        assert_eq!(transport.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_delivers_packet_to_receiver() {
        // Arrange
        let (transport, mut rx) = ChannelTransport::new();

        // Act
        transport.send(CommandPacket::message(MessageId::Ping));

        // Assert
        assert_eq!(rx.try_recv().unwrap(), CommandPacket::message(MessageId::Ping));
        assert_eq!(transport.sent_count(), 1);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_not_counted() {
        let (transport, rx) = ChannelTransport::new();
        drop(rx);
        transport.send(CommandPacket::message(MessageId::Ack));
        assert_eq!(transport.sent_count(), 0);
    }
}
