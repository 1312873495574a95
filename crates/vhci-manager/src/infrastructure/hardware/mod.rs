//! Controller runtime adapters.
//!
//! Only the simulated runtime ships with the crate.  A native adapter wraps
//! the platform driver API and implements the same
//! [`HardwareRuntime`](crate::application::hardware::HardwareRuntime) trait.

pub mod simulated;
