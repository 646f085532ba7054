// libnfc/src/prelude.rs

pub use crate::config::DeviceConfig;
pub use crate::dep::{DepInitiator, DepTarget, dep_target};
pub use crate::device::{Device, DeviceBuilder, Idle, InitiatorMode, POLL_FOREVER, TargetMode};
pub use crate::emulation::{EmulationExit, Emulator, EmulatorIo, Exchange, emulate};
pub use crate::relay::{Relay, RelayStats, RelayStopper};
pub use crate::transport::{LoopbackTransport, MockTransport, Transport, TransportOption};
pub use crate::{
    BaudRate, BitFrame, DepInfo, DepMode, Error, Idm, Modulation, ModulationType, Nfcid3, Pmm,
    Result, SystemCode, Target, Uid,
};

// Re-export small utilities for convenience
pub use crate::utils::{AbortHandle, Timeout, bytes_to_hex, bytes_to_hex_spaced, ms, parse_hex};
