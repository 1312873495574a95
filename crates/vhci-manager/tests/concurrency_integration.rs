//! Integration test driving the engine from all of its sources at once.
//!
//! Runs on the multi-threaded runtime: agent packets arrive on the test task,
//! controller events are raised from a plain OS thread, and the watchdog
//! ticks on a short period, all against one shared engine.

mod common;

use std::time::Duration;

use common::{comm_logging_on, Harness};
use vhci_core::{CommandPacket, MessageId, PacketKind};
use vhci_manager::application::engine::EngineConfig;
use vhci_manager::infrastructure::hardware::simulated::SimulatedHardware;

const AGENT_FRAMES: u8 = 200;
const CONTROLLER_EVENTS: u8 = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sources_keep_log_and_replies_consistent() {
    // Arrange
    let config = EngineConfig {
        event_queue_depth: 1024,
        watchdog_period: Duration::from_millis(2),
        ..EngineConfig::default()
    };
    let mut h = Harness::with_config(SimulatedHardware::new(), comm_logging_on(), config);
    h.engine.start().await;

    // Act
    let hardware = h.hardware.clone();
    let controller = std::thread::spawn(move || {
        let mut accepted: usize = 0;
        for i in 0..CONTROLLER_EVENTS {
            if hardware.inject_event(&[0x04, 0xff, i]) {
                accepted += 1;
            }
            std::thread::yield_now();
        }
        accepted
    });

    for i in 0..AGENT_FRAMES {
        h.engine
            .handle_packet(CommandPacket::hci_data(vec![0x01, i, 0x0c, 0x00]))
            .await;
        h.engine
            .handle_packet(CommandPacket::message(MessageId::Ping))
            .await;
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    let accepted = tokio::task::spawn_blocking(move || controller.join())
        .await
        .unwrap()
        .unwrap();
    h.engine.detach().await;

    // Assert – every sequence number is used exactly once, in order
    assert_eq!(accepted, CONTROLLER_EVENTS as usize);
    let log = h.engine.comm_log().await;
    assert!(
        log.windows(2)
            .all(|pair| pair[1].sequence == pair[0].sequence + 1),
        "comm log sequence has gaps or repeats"
    );
    let lines = |prefix: &str| log.iter().filter(|e| e.text.starts_with(prefix)).count();
    assert_eq!(lines("CommandPacket: "), AGENT_FRAMES as usize);
    assert_eq!(lines("Ping"), AGENT_FRAMES as usize);
    assert_eq!(lines("EventPacket: "), accepted);
    assert_eq!(log.len(), 2 * AGENT_FRAMES as usize + accepted);

    // Assert – one status per inbound frame, every event forwarded
    let sent = h.drain();
    let statuses: Vec<u32> = sent
        .iter()
        .filter(|p| p.kind == PacketKind::HciDataError)
        .map(|p| p.first_dword().unwrap())
        .collect();
    assert_eq!(statuses, vec![0; AGENT_FRAMES as usize]);
    assert_eq!(h.hardware.sent_frames().len(), AGENT_FRAMES as usize);
    assert_eq!(
        sent.iter().filter(|p| p.kind == PacketKind::HciData).count(),
        accepted
    );
    assert!(
        sent.contains(&CommandPacket::message(MessageId::Ping)),
        "watchdog never ticked"
    );
}
