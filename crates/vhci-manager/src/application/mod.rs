//! Application layer for the session manager.
//!
//! # What lives here? (for beginners)
//!
//! - **`hardware`** / **`transport`** – The two *ports*: traits describing
//!   what the engine needs from the local controller runtime and from the
//!   packet channel to the agent.  Concrete implementations live in the
//!   infrastructure layer and are injected at construction time.
//!
//! - **`session`** – Attach/detach of the virtual controller and the state
//!   a view shows about it (handle, error code, device identity).
//!
//! - **`handshake`** – The Ack → Initialize → LoggingOn/Off exchange that
//!   keeps both sides in step.
//!
//! - **`relay`** – Delivers the agent's HCI frames to the controller and
//!   reports the result; forwards controller events to the agent.
//!
//! - **`watchdog`** – A periodic task that pings the agent and ends the
//!   session when the transport is gone.
//!
//! - **`comm_log`** – The user-facing record of traffic, gated by a switch.
//!
//! - **`engine`** – Owns all of the above behind one lock and is the only
//!   type the binary or a view talks to.

pub mod comm_log;
pub mod engine;
pub mod handshake;
pub mod hardware;
pub mod relay;
pub mod session;
pub mod transport;
pub mod watchdog;
