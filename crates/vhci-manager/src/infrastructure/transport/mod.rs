//! Agent channel adapters.

pub mod channel;
