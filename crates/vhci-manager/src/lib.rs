//! vhci-manager library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does vhci-manager do? (for beginners)
//!
//! The manager sits between a Bluetooth controller on this machine and a
//! Bluetooth *host* running inside another process (the *agent*).  It:
//!
//! 1. Opens the virtual controller through the platform runtime and reads
//!    its identity (address, HCI/LMP versions, manufacturer).
//! 2. Greets the agent and runs a short handshake so both sides agree the
//!    link is initialised and whether the agent should log on its side.
//! 3. Relays HCI frames: commands and data from the agent go to the
//!    controller (each answered with a status code), events from the
//!    controller go to the agent.
//! 4. Pings the agent every five seconds and closes the controller when the
//!    agent is gone.
//! 5. Keeps an optional in-memory communication log for the user.

/// Application layer: ports, session, handshake, relay, watchdog, engine.
pub mod application;

/// Infrastructure layer: runtime and transport adapters, settings storage.
pub mod infrastructure;
