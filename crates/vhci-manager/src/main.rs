//! VHCI session manager entry point.
//!
//! Runs the session engine against the simulated controller runtime and an
//! in-process loopback agent, which is enough to watch the handshake, relay
//! and watchdog at work with `RUST_LOG=debug`.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ StartupConfig::load()    -- logging switches + manager settings
//!  └─ SessionEngine::new()     -- spawns the hardware event pump
//!  └─ run_loopback_agent()     -- answers the handshake, sends HCI_Reset
//!  └─ select loop              -- inbound bytes, view events, Ctrl-C
//!  └─ save_config()            -- persists the logging switches if they loaded
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vhci_core::{encode_packet, to_hex, CommandPacket, MessageId, PeerPacket};
use vhci_manager::application::engine::{SessionEngine, ViewEvent};
use vhci_manager::infrastructure::hardware::simulated::SimulatedHardware;
use vhci_manager::infrastructure::storage::config::{save_config, StartupConfig};
use vhci_manager::infrastructure::transport::channel::ChannelTransport;

/// HCI_Reset command frame.
const HCI_RESET: [u8; 4] = [0x01, 0x03, 0x0c, 0x00];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Settings are read first so the configured log level can apply.
    let startup = StartupConfig::load();
    let mut config = startup.config.clone();

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.manager.log_level)),
        )
        .init();

    if let Some(e) = &startup.load_error {
        warn!("using default settings, the settings file will not be saved: {e}");
    }
    info!("VHCI session manager starting");

    let hardware = Arc::new(SimulatedHardware::answering_commands());
    let (transport, outbound_rx) = ChannelTransport::new();
    let transport = Arc::new(transport);

    let (engine, mut view_rx) = SessionEngine::new(
        hardware,
        transport,
        config.engine_config(),
        config.logging,
    );

    // ── Loopback agent ────────────────────────────────────────────────────────
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_loopback_agent(outbound_rx, inbound_tx));

    engine.start().await;
    info!("VHCI session manager ready.  Press Ctrl-C to exit.");

    // ── Main loop ─────────────────────────────────────────────────────────────
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("could not listen for Ctrl-C: {e}");
                }
                info!("shutdown signal received");
                break;
            }
            Some(bytes) = inbound_rx.recv() => engine.receive_bytes(&bytes).await,
            Some(event) = view_rx.recv() => log_view_event(event),
        }
    }

    config.logging = engine.logging().await;
    engine.shutdown().await;
    if startup.may_save() {
        save_config(&config)?;
    }

    info!("VHCI session manager stopped");
    Ok(())
}

fn log_view_event(event: ViewEvent) {
    match event {
        ViewEvent::SessionChanged(state) => info!("session {state}"),
        ViewEvent::CommLogAppended(entry) => info!("[{}] {}", entry.sequence, entry.text),
        ViewEvent::CommLogCleared => debug!("comm log cleared"),
        ViewEvent::LoggingChanged(logging) => debug!("logging switches now {logging:?}"),
    }
}

/// Plays the agent: completes the handshake, then sends one HCI_Reset.
async fn run_loopback_agent(
    mut outbound_rx: mpsc::UnboundedReceiver<CommandPacket>,
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,
) {
    let reply = |packet: CommandPacket| match encode_packet(&packet) {
        Ok(bytes) => inbound_tx.send(bytes).is_ok(),
        Err(e) => {
            warn!("agent could not encode reply: {e}");
            true
        }
    };

    while let Some(packet) = outbound_rx.recv().await {
        let peer = match PeerPacket::try_from(&packet) {
            Ok(peer) => peer,
            Err(e) => {
                warn!("agent got malformed packet: {e}");
                continue;
            }
        };
        let open = match peer {
            PeerPacket::Message(MessageId::Ack) => reply(CommandPacket::message(MessageId::Ack)),
            PeerPacket::Message(MessageId::Initialize) => {
                reply(CommandPacket::message(MessageId::Initialize))
            }
            PeerPacket::Message(id @ (MessageId::LoggingOn | MessageId::LoggingOff)) => {
                info!("agent initialised ({id})");
                reply(CommandPacket::hci_data(HCI_RESET.to_vec()))
            }
            PeerPacket::Message(id) => {
                debug!("agent got {id}");
                true
            }
            PeerPacket::HciDataError(code) => {
                debug!("agent got delivery status {code}");
                true
            }
            PeerPacket::HciData(frames) => {
                for frame in frames {
                    debug!("agent got frame {}", to_hex(&frame));
                }
                true
            }
        };
        if !open {
            break;
        }
    }
}
