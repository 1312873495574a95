//! Shared harness for the engine integration tests.
//!
//! Wires a [`SessionEngine`] to a [`SimulatedHardware`] runtime and a
//! [`ChannelTransport`], keeping the agent end of the channel and the view
//! receiver so tests can inspect everything the engine emits.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use vhci_core::{CommandPacket, LoggingConfig, MessageId};
use vhci_manager::application::engine::{EngineConfig, SessionEngine, ViewEvent};
use vhci_manager::infrastructure::hardware::simulated::SimulatedHardware;
use vhci_manager::infrastructure::transport::channel::ChannelTransport;

pub struct Harness {
    pub engine: SessionEngine,
    pub hardware: Arc<SimulatedHardware>,
    pub transport: Arc<ChannelTransport>,
    pub outbound: mpsc::UnboundedReceiver<CommandPacket>,
    pub view: mpsc::Receiver<ViewEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(SimulatedHardware::new(), LoggingConfig::default())
    }

    pub fn with_logging(logging: LoggingConfig) -> Self {
        Self::with(SimulatedHardware::new(), logging)
    }

    pub fn with(hardware: SimulatedHardware, logging: LoggingConfig) -> Self {
        Self::with_config(hardware, logging, EngineConfig::default())
    }

    pub fn with_config(
        hardware: SimulatedHardware,
        logging: LoggingConfig,
        config: EngineConfig,
    ) -> Self {
        let hardware = Arc::new(hardware);
        let (transport, outbound) = ChannelTransport::new();
        let transport = Arc::new(transport);
        let (engine, view) =
            SessionEngine::new(hardware.clone(), transport.clone(), config, logging);
        Self {
            engine,
            hardware,
            transport,
            outbound,
            view,
        }
    }

    /// Starts the engine and discards the greeting `Ack`.
    pub async fn started(self) -> Self {
        let mut harness = self;
        harness.engine.start().await;
        assert_eq!(harness.drain(), vec![CommandPacket::message(MessageId::Ack)]);
        harness
    }

    /// Everything sent to the agent so far.
    pub fn drain(&mut self) -> Vec<CommandPacket> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.outbound.try_recv() {
            packets.push(packet);
        }
        packets
    }

    /// Every view notification so far.
    pub fn drain_view(&mut self) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.view.try_recv() {
            events.push(event);
        }
        events
    }

    /// Waits for the next packet sent to the agent.
    pub async fn next_packet(&mut self) -> Option<CommandPacket> {
        tokio::time::timeout(Duration::from_secs(1), self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn comm_log_texts(&self) -> Vec<String> {
        self.engine
            .comm_log()
            .await
            .into_iter()
            .map(|entry| entry.text)
            .collect()
    }
}

pub fn comm_logging_on() -> LoggingConfig {
    LoggingConfig {
        comm_logging: true,
        ..LoggingConfig::default()
    }
}
