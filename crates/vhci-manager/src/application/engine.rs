//! Session engine: the single owner of session, handshake, relay and logs.
//!
//! # Concurrency model (for beginners)
//!
//! Three independent sources drive the engine:
//!
//! 1. The host delivering packets from the agent
//!    ([`SessionEngine::handle_packet`]).
//! 2. The controller runtime raising HCI events on its own thread.
//! 3. The watchdog task waking every few seconds.
//!
//! All mutable state lives in one [`EngineState`] behind a
//! `tokio::sync::Mutex`, so only one of them changes it at a time.  The
//! runtime's callback thread never takes that lock: it pushes events into a
//! bounded channel and a single *event pump* task applies them.  The channel's
//! receiving end lives inside [`EngineState`], so a detach applies whatever is
//! still queued before the device is released.  The view is
//! told about changes through a second channel of [`ViewEvent`]s returned by
//! [`SessionEngine::new`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vhci_core::{
    decode_packet, CommandPacket, HardwareState, LoggingConfig, MessageId, PeerPacket,
};

use crate::application::comm_log::{CommLog, CommLogEntry};
use crate::application::handshake::{Handshake, HandshakeState};
use crate::application::hardware::{
    DeviceHandle, HardwareEvent, HardwareRuntime, HciEventSink,
};
use crate::application::relay::{self, Delivery};
use crate::application::session::{AttachOutcome, Session};
use crate::application::transport::{ConnectionState, TransportChannel};
use crate::application::watchdog::{TickOutcome, Watchdog, WATCHDOG_PERIOD};

/// Capacity of the view notification channel.
const VIEW_CHANNEL_CAPACITY: usize = 256;

// ── Public types ──────────────────────────────────────────────────────────────

/// Fixed settings of an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// File the controller runtime writes its diagnostic log to.
    pub runtime_log_file: String,
    /// Capacity of the queue between the runtime callback and the engine.
    pub event_queue_depth: usize,
    pub watchdog_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            runtime_log_file: "VhciManager.txt".to_string(),
            event_queue_depth: 64,
            watchdog_period: WATCHDOG_PERIOD,
        }
    }
}

/// Change notifications for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SessionChanged(HardwareState),
    CommLogAppended(CommLogEntry),
    CommLogCleared,
    LoggingChanged(LoggingConfig),
}

// ── Engine state ──────────────────────────────────────────────────────────────

struct EngineState {
    session: Session,
    handshake: Handshake,
    comm_log: CommLog,
    logging: LoggingConfig,
    /// Present exactly while the session is attached.
    watchdog: Option<Watchdog>,
    events_rx: mpsc::Receiver<HardwareEvent>,
}

struct EngineInner {
    state: Mutex<EngineState>,
    hardware: Arc<dyn HardwareRuntime>,
    transport: Arc<dyn TransportChannel>,
    events_tx: mpsc::Sender<HardwareEvent>,
    events_ready: Arc<Notify>,
    notify_tx: mpsc::Sender<ViewEvent>,
    config: EngineConfig,
}

/// Drives one device session against one agent.
pub struct SessionEngine {
    inner: Arc<EngineInner>,
    event_pump: Option<JoinHandle<()>>,
}

impl SessionEngine {
    /// Creates the engine and spawns its event pump.
    ///
    /// Must be called from within a Tokio runtime.  Returns the engine and
    /// the receiver for view notifications.
    pub fn new(
        hardware: Arc<dyn HardwareRuntime>,
        transport: Arc<dyn TransportChannel>,
        config: EngineConfig,
        logging: LoggingConfig,
    ) -> (Self, mpsc::Receiver<ViewEvent>) {
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_depth.max(1));
        let (notify_tx, notify_rx) = mpsc::channel(VIEW_CHANNEL_CAPACITY);
        let events_ready = Arc::new(Notify::new());

        let inner = Arc::new(EngineInner {
            state: Mutex::new(EngineState {
                session: Session::new(),
                handshake: Handshake::new(),
                comm_log: CommLog::new(),
                logging,
                watchdog: None,
                events_rx,
            }),
            hardware,
            transport,
            events_tx,
            events_ready: Arc::clone(&events_ready),
            notify_tx,
            config,
        });

        let event_pump = tokio::spawn(run_event_pump(Arc::downgrade(&inner), events_ready));

        (
            Self {
                inner,
                event_pump: Some(event_pump),
            },
            notify_rx,
        )
    }

    /// Attaches the device and greets the agent with `Ack`.
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.attach_locked(&mut state);
        let ack = state.handshake.start();
        self.inner.send(&state, CommandPacket::message(ack));
    }

    /// Opens the device.  A no-op while attached.
    pub async fn attach(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.attach_locked(&mut state);
    }

    /// Releases the device.  A no-op unless attached.
    ///
    /// Returns once events are unsubscribed and the watchdog has stopped.
    pub async fn detach(&self) {
        self.inner.detach().await;
    }

    /// Reacts to a change of the transport's connection state.  Losing the
    /// connection ends the session.
    pub async fn connection_changed(&self, connection: ConnectionState) {
        match connection {
            ConnectionState::Connected => debug!("transport connected"),
            ConnectionState::Disconnected => {
                info!("transport disconnected, detaching");
                self.inner.detach().await;
            }
        }
    }

    /// Handles one packet received from the agent.  Malformed packets are
    /// dropped.
    pub async fn handle_packet(&self, packet: CommandPacket) {
        let peer = match PeerPacket::try_from(&packet) {
            Ok(peer) => peer,
            Err(e) => {
                debug!("dropping malformed {:?} packet: {e}", packet.kind);
                return;
            }
        };

        let mut state = self.inner.state.lock().await;
        match peer {
            PeerPacket::HciData(frames) => {
                for frame in frames.iter().filter(|f| !f.is_empty()) {
                    self.inner.relay_inbound(&mut state, frame);
                }
            }
            PeerPacket::HciDataError(code) => {
                debug!("agent reported delivery status {code}");
            }
            PeerPacket::Message(id) => self.inner.on_message(&mut state, id),
        }
    }

    /// Decodes a buffer holding one or more packets and handles each.
    ///
    /// Decoding stops at the first malformed packet; the rest of the buffer
    /// is dropped.
    pub async fn receive_bytes(&self, bytes: &[u8]) {
        let mut cursor = 0;
        while cursor < bytes.len() {
            match decode_packet(&bytes[cursor..]) {
                Ok((packet, consumed)) => {
                    cursor += consumed;
                    self.handle_packet(packet).await;
                }
                Err(e) => {
                    debug!("dropping {} undecodable bytes: {e}", bytes.len() - cursor);
                    return;
                }
            }
        }
    }

    /// Switches device-side logging and tells the agent immediately.
    pub async fn set_device_logging(&self, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        if state.logging.device_logging == enabled {
            return;
        }
        state.logging.device_logging = enabled;
        self.inner.notify(ViewEvent::LoggingChanged(state.logging));
        self.inner.send(
            &state,
            CommandPacket::message(MessageId::for_device_logging(enabled)),
        );
    }

    /// Switches the controller runtime's desktop log.
    pub async fn set_desktop_logging(&self, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        if state.logging.desktop_logging == enabled {
            return;
        }
        state.logging.desktop_logging = enabled;
        self.inner.notify(ViewEvent::LoggingChanged(state.logging));
        self.inner
            .hardware
            .set_log_level(state.logging.runtime_log_level());
    }

    /// Switches the communication log.  Either direction clears it.
    pub async fn set_comm_logging(&self, enabled: bool) {
        let mut state = self.inner.state.lock().await;
        if state.logging.comm_logging == enabled {
            return;
        }
        state.logging.comm_logging = enabled;
        self.inner.clear_comm_log_locked(&mut state);
        self.inner.notify(ViewEvent::LoggingChanged(state.logging));
    }

    /// Empties the communication log.
    pub async fn clear_comm_log(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.clear_comm_log_locked(&mut state);
    }

    // ── Read accessors ────────────────────────────────────────────────────────

    pub async fn session(&self) -> Session {
        self.inner.state.lock().await.session.clone()
    }

    pub async fn comm_log(&self) -> Vec<CommLogEntry> {
        self.inner.state.lock().await.comm_log.entries().to_vec()
    }

    pub async fn handshake_state(&self) -> HandshakeState {
        self.inner.state.lock().await.handshake.state()
    }

    pub async fn logging(&self) -> LoggingConfig {
        self.inner.state.lock().await.logging
    }

    /// Whether the watchdog task is currently running.
    pub async fn watchdog_running(&self) -> bool {
        self.inner
            .state
            .lock()
            .await
            .watchdog
            .as_ref()
            .is_some_and(Watchdog::is_running)
    }

    /// Detaches and stops the event pump.
    pub async fn shutdown(mut self) {
        self.inner.detach().await;
        if let Some(pump) = self.event_pump.take() {
            pump.abort();
            let _ = pump.await;
        }
        info!("session engine stopped");
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        if let Some(pump) = self.event_pump.take() {
            pump.abort();
        }
    }
}

// ── Event pump ────────────────────────────────────────────────────────────────

/// Waits for queued hardware events and applies them under the state lock.
async fn run_event_pump(inner: Weak<EngineInner>, events_ready: Arc<Notify>) {
    loop {
        events_ready.notified().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let mut state = inner.state.lock().await;
        inner.apply_queued_events(&mut state);
    }
    debug!("event pump finished");
}

// ── Engine internals ──────────────────────────────────────────────────────────

impl EngineInner {
    fn attach_locked(self: &Arc<Self>, state: &mut EngineState) {
        let logging = state.logging;
        match state
            .session
            .attach(self.hardware.as_ref(), &self.config.runtime_log_file, &logging)
        {
            AttachOutcome::AlreadyAttached => {}
            AttachOutcome::Attached(handle) => {
                let sink = HciEventSink::new(
                    handle,
                    self.events_tx.clone(),
                    Arc::clone(&self.events_ready),
                );
                self.hardware.subscribe_events(handle, sink);
                state.watchdog = Some(self.start_watchdog(handle));
                self.notify(ViewEvent::SessionChanged(HardwareState::Attached));
            }
            AttachOutcome::Failed { .. } => {
                self.notify(ViewEvent::SessionChanged(HardwareState::Unavailable));
            }
        }
    }

    fn start_watchdog(self: &Arc<Self>, handle: DeviceHandle) -> Watchdog {
        let weak = Arc::downgrade(self);
        Watchdog::start(self.config.watchdog_period, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => inner.watchdog_tick(handle).await,
                    None => TickOutcome::Stop,
                }
            }
        })
    }

    async fn watchdog_tick(&self, handle: DeviceHandle) -> TickOutcome {
        let mut state = self.state.lock().await;
        if state.session.handle() != Some(handle) {
            return TickOutcome::Stop;
        }
        match self.transport.connection_state() {
            ConnectionState::Connected => {
                self.send(&state, CommandPacket::message(MessageId::Ping));
                TickOutcome::Continue
            }
            ConnectionState::Disconnected => {
                info!("agent unreachable, ending session");
                if let Some(watchdog) = self.detach_locked(&mut state) {
                    watchdog.release();
                }
                TickOutcome::Stop
            }
        }
    }

    async fn detach(&self) {
        let pending = {
            let mut state = self.state.lock().await;
            self.detach_locked(&mut state).and_then(Watchdog::cancel)
        };
        if let Some(task) = pending {
            let _ = task.await;
        }
    }

    /// Releases the device.  Returns the watchdog so the caller decides how
    /// it ends.
    fn detach_locked(&self, state: &mut EngineState) -> Option<Watchdog> {
        state.session.stop_events(self.hardware.as_ref())?;
        // Events queued before the unsubscribe still belong to this session.
        self.apply_queued_events(state);
        state.session.detach(self.hardware.as_ref())?;
        self.notify(ViewEvent::SessionChanged(HardwareState::Detached));
        state.watchdog.take()
    }

    fn on_message(&self, state: &mut EngineState, id: MessageId) {
        self.record(state, || id.name().to_string());
        let device_logging = state.logging.device_logging;
        if let Some(reply) = state.handshake.on_message(id, device_logging) {
            self.send(state, CommandPacket::message(reply));
        }
    }

    fn relay_inbound(&self, state: &mut EngineState, frame: &[u8]) {
        let delivery: Delivery =
            relay::deliver_frame(self.hardware.as_ref(), state.session.handle(), frame);
        self.send(state, delivery.reply());
        self.record(state, || relay::inbound_log_line(frame, &delivery));
    }

    fn apply_queued_events(&self, state: &mut EngineState) {
        while let Ok(event) = state.events_rx.try_recv() {
            self.apply_hardware_event(state, event);
        }
    }

    fn apply_hardware_event(&self, state: &mut EngineState, event: HardwareEvent) {
        if state.session.handle() != Some(event.handle) {
            debug!("dropping event for stale handle {}", event.handle);
            return;
        }
        self.record(state, || relay::event_log_line(&event.frame));
        self.send(state, CommandPacket::hci_data(event.frame));
    }

    fn clear_comm_log_locked(&self, state: &mut EngineState) {
        state.comm_log.clear();
        self.notify(ViewEvent::CommLogCleared);
    }

    fn record(&self, state: &mut EngineState, text: impl FnOnce() -> String) {
        let enabled = state.logging.comm_logging;
        if let Some(entry) = state.comm_log.record(enabled, text) {
            self.notify(ViewEvent::CommLogAppended(entry));
        }
    }

    /// Hands `packet` to the transport when connected and attached.
    fn send(&self, state: &EngineState, packet: CommandPacket) {
        if self.transport.connection_state() != ConnectionState::Connected {
            debug!("transport not connected, dropping {:?} packet", packet.kind);
            return;
        }
        if !state.session.is_attached() {
            debug!("no device attached, dropping {:?} packet", packet.kind);
            return;
        }
        self.transport.send(packet);
    }

    fn notify(&self, event: ViewEvent) {
        match self.notify_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("view channel full, dropping {event:?}");
            }
            // No view is listening.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
