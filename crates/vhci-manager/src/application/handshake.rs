//! Handshake state machine.
//!
//! The engine greets the agent with `Ack`.  The agent answers `Ack`, the
//! engine requests `Initialize`, and when the agent confirms with its own
//! `Initialize` the engine tells it whether device-side logging is wanted.
//! `Uninitialize` from the agent restarts the exchange at `Initialize`.
//!
//! ```text
//!  Idle ──start/Ack──► AckSent ──recv Ack/Initialize──► Initializing
//!                                                           │
//!                         recv Initialize/LoggingOn|Off     ▼
//!                                                       Initialized
//!  any ──recv Uninitialize/Initialize──► Initializing
//!  any ──recv ComClose/Uninitialize────► Uninitializing
//! ```
//!
//! The machine is pure: it returns the reply to send and leaves sending and
//! logging to the engine.

use serde::Serialize;
use tracing::debug;
use vhci_core::MessageId;

/// Progress of the handshake with the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum HandshakeState {
    #[default]
    Idle,
    AckSent,
    Initializing,
    Initialized,
    Uninitializing,
}

/// Handshake with the agent.
#[derive(Debug, Default)]
pub struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Begins a new exchange.  Returns the message to send (`Ack`).
    pub fn start(&mut self) -> MessageId {
        self.state = HandshakeState::AckSent;
        MessageId::Ack
    }

    /// Applies a message received from the agent.
    ///
    /// Returns the reply to send, if any.  `device_logging` selects between
    /// `LoggingOn` and `LoggingOff` when the agent confirms initialisation.
    pub fn on_message(&mut self, id: MessageId, device_logging: bool) -> Option<MessageId> {
        let (next, reply) = match id {
            MessageId::Ack => (HandshakeState::Initializing, Some(MessageId::Initialize)),
            MessageId::Initialize => (
                HandshakeState::Initialized,
                Some(MessageId::for_device_logging(device_logging)),
            ),
            MessageId::Uninitialize => (HandshakeState::Initializing, Some(MessageId::Initialize)),
            // The agent is closing its port: ask it to tear down its side.
            MessageId::ComClose => (HandshakeState::Uninitializing, Some(MessageId::Uninitialize)),
            MessageId::Ping | MessageId::ComOpen | MessageId::LoggingOn | MessageId::LoggingOff => {
                (self.state, None)
            }
        };
        if next != self.state {
            debug!("handshake {:?} -> {:?} on {id}", self.state, next);
        }
        self.state = next;
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_sends_ack() {
        let mut handshake = Handshake::new();
        assert_eq!(handshake.start(), MessageId::Ack);
        assert_eq!(handshake.state(), HandshakeState::AckSent);
    }

    #[test]
    fn test_full_exchange_with_logging_off() {
        // Arrange
        let mut handshake = Handshake::new();
        let mut sent = vec![handshake.start()];

        // Act
        sent.extend(handshake.on_message(MessageId::Ack, false));
        sent.extend(handshake.on_message(MessageId::Initialize, false));

        // Assert
        assert_eq!(
            sent,
            vec![MessageId::Ack, MessageId::Initialize, MessageId::LoggingOff]
        );
        assert_eq!(handshake.state(), HandshakeState::Initialized);
    }

    #[test]
    fn test_initialize_reply_follows_device_logging_flag() {
        let mut handshake = Handshake::new();
        assert_eq!(
            handshake.on_message(MessageId::Initialize, true),
            Some(MessageId::LoggingOn)
        );
    }

    #[test]
    fn test_uninitialize_restarts_from_any_state() {
        for prior in [MessageId::Ack, MessageId::Initialize, MessageId::ComClose] {
            let mut handshake = Handshake::new();
            handshake.on_message(prior, false);

            let reply = handshake.on_message(MessageId::Uninitialize, false);

            assert_eq!(reply, Some(MessageId::Initialize));
            assert_eq!(handshake.state(), HandshakeState::Initializing);
        }
    }

    #[test]
    fn test_com_close_requests_uninitialize() {
        // Arrange
        let mut handshake = Handshake::new();
        handshake.start();
        handshake.on_message(MessageId::Ack, false);
        handshake.on_message(MessageId::Initialize, false);

        // Act
        let reply = handshake.on_message(MessageId::ComClose, false);

        // Assert
        assert_eq!(reply, Some(MessageId::Uninitialize));
        assert_eq!(handshake.state(), HandshakeState::Uninitializing);
    }

    #[test]
    fn test_informational_messages_change_nothing() {
        let mut handshake = Handshake::new();
        handshake.start();
        for id in [
            MessageId::Ping,
            MessageId::ComOpen,
            MessageId::LoggingOn,
            MessageId::LoggingOff,
        ] {
            assert_eq!(handshake.on_message(id, true), None);
            assert_eq!(handshake.state(), HandshakeState::AckSent);
        }
    }
}
