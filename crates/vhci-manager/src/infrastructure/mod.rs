//! Infrastructure layer for the session manager.
//!
//! Contains the adapters behind the application ports: a simulated
//! controller runtime, an in-process agent channel, and file-system storage
//! for settings.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vhci_core`, but MUST NOT be imported by the `application` layer.

pub mod hardware;
pub mod storage;
pub mod transport;
