// libnfc/src/device/mod.rs

//! Device handle and its builder.

pub mod builder;
pub mod handle;

pub use builder::DeviceBuilder;
pub use handle::{Device, Idle, InitiatorMode, POLL_FOREVER, TargetMode};
